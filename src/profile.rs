use crate::interface::TransactionConfig;
use crate::irq::IrqMap;
use crate::mod_params::*;

/// Electrical reset sequence of a chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSequence {
    /// Wait before asserting reset
    pub before_ms: u32,
    /// Time reset is held asserted
    pub asserted_ms: u32,
    /// Settle time after release before the chip answers
    pub settle_ms: u32,
}

/// Register holding a version or identity the chip must report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Register address
    pub address: u32,
    /// Number of bytes to read, at most 16
    pub len: usize,
    /// Accepted values; a read matches when it starts with one of them
    pub expected: &'static [&'static [u8]],
}

impl Identity {
    /// Whether `read` identifies the chip
    pub fn matches(&self, read: &[u8]) -> bool {
        self.expected.iter().any(|value| read.starts_with(value))
    }
}

/// Static description of a chip family member: everything the generic controller needs to
/// know about it that is data rather than behaviour.
#[derive(Debug, Clone, Copy)]
pub struct ChipProfile {
    /// Part name, for logs
    pub name: &'static str,
    /// Register transaction layout
    pub transaction: TransactionConfig,
    /// Logical interrupt events to chip bits
    pub irq_map: IrqMap,
    /// Identity check run after reset
    pub identity: Identity,
    /// Reset line timing
    pub reset: ResetSequence,
    /// Modems the chip can run
    pub modems: &'static [Modem],
    /// Lowest and highest carrier frequency in Hz
    pub frequency_range: (u32, u32),
    /// Lowest and highest output power in dBm
    pub output_power_range: (i8, i8),
    /// Largest payload in bytes
    pub max_payload_len: usize,
    /// Lowest and highest power amplifier current limit in mA
    pub current_limit_range: (u16, u16),
    /// Whether the chip can alternate reception and sleep on its own
    pub rx_duty_cycle: bool,
}

impl ChipProfile {
    /// Whether `modem` can run on this chip
    pub fn supports(&self, modem: Modem) -> bool {
        self.modems.contains(&modem)
    }

    /// Check a carrier frequency against the chip's range
    pub fn check_frequency(&self, frequency_in_hz: u32) -> Result<(), RadioError> {
        let (min, max) = self.frequency_range;
        if (min..=max).contains(&frequency_in_hz) {
            Ok(())
        } else {
            Err(RadioError::InvalidFrequency(frequency_in_hz))
        }
    }

    /// Check an output power against the chip's range
    pub fn check_output_power(&self, output_power: i8) -> Result<(), RadioError> {
        let (min, max) = self.output_power_range;
        if (min..=max).contains(&output_power) {
            Ok(())
        } else {
            Err(RadioError::InvalidOutputPower(output_power))
        }
    }

    /// Check a current limit against the chip's range
    pub fn check_current_limit(&self, milliamps: u16) -> Result<(), RadioError> {
        let (min, max) = self.current_limit_range;
        if (min..=max).contains(&milliamps) {
            Ok(())
        } else {
            Err(RadioError::InvalidCurrentLimit(milliamps))
        }
    }
}
