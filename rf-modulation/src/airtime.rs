use crate::*;

// LR-FHSS framing: coded bits per block, on-air bits per block, bits per header repetition
const LR_FHSS_BLOCK_CODED_BITS: u64 = 48;
const LR_FHSS_BLOCK_AIR_BITS: u64 = 50;
const LR_FHSS_BLOCK_PADDING_BITS: u64 = 2;
const LR_FHSS_HEADER_BITS: u64 = 114;
const LR_FHSS_BIT_RATE: f32 = 488.28215;

/// Largest frame any supported chip can carry, used when the expected length is unknown.
pub const MAX_PAYLOAD_LENGTH: usize = 255;

/// Shape of a LoRa frame on air, independent of the coding rate.
///
/// The coding rate only scales `payload_blocks`; everything else is fixed by the spreading
/// factor, bandwidth, framing and payload length.
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoRaFrameShape {
    /// Symbol period in microseconds
    pub symbol_duration_us: u32,
    /// Preamble, sync and header symbols, in quarter symbols
    pub fixed_symbols_x4: u32,
    /// Number of coded blocks carrying the payload; each block is CR+4 symbols long
    pub payload_blocks: u32,
}

impl LoRaFrameShape {
    /// Frame shape for a payload of `len` bytes.
    pub fn new(params: &LoRaParams, packet: &PacketConfig, len: usize) -> Self {
        let sf = params.spreading_factor.value() as u64;

        // SF5 and SF6 use a longer sync sequence and no extra header symbols
        let (sf_coeff1_x4, sf_coeff2) = if sf <= 6 { (25, 0) } else { (17, 8) };
        let sf_divisor = if params.ldro_enabled() { 4 * (sf - 2) } else { 4 * sf };

        let bit_count = (len as u64)
            .saturating_mul(8)
            .saturating_add(if packet.crc.is_on() { 16 } else { 0 })
            .saturating_add(sf_coeff2)
            .saturating_add(if packet.implicit_header { 0 } else { 20 })
            .saturating_sub(4 * sf);
        let payload_blocks = u32::try_from(bit_count.div_ceil(sf_divisor)).unwrap_or(u32::MAX);

        Self {
            symbol_duration_us: params.symbol_duration_us(),
            fixed_symbols_x4: (packet.preamble_length as u32 + 8) * 4 + sf_coeff1_x4,
            payload_blocks,
        }
    }

    /// Total number of symbols in quarter symbols for the given coding rate
    pub fn symbols_x4(&self, coding_rate: CodingRate) -> u32 {
        self.fixed_symbols_x4
            .saturating_add(self.payload_blocks.saturating_mul(coding_rate.denominator() as u32 * 4))
    }

    /// Time on air in microseconds for the given coding rate
    pub fn time_on_air_us(&self, coding_rate: CodingRate) -> u32 {
        saturate((self.symbol_duration_us as u64 * self.symbols_x4(coding_rate) as u64) / 4)
    }
}

fn saturate(us: u64) -> u32 {
    u32::try_from(us).unwrap_or(u32::MAX)
}

/// Time on air of a LoRa frame, in microseconds.
pub fn lora_time_on_air_us(params: &LoRaParams, packet: &PacketConfig, len: usize) -> u32 {
    LoRaFrameShape::new(params, packet, len).time_on_air_us(params.coding_rate)
}

/// Time on air of an FSK frame, in microseconds.
pub fn fsk_time_on_air_us(params: &FskParams, packet: &PacketConfig, len: usize) -> u32 {
    if params.bit_rate_bps == 0 {
        return u32::MAX;
    }
    let bits = (packet.crc.len() as u64 * 8
        + packet.sync_word.len_bits as u64
        + packet.preamble_length as u64)
        .saturating_add((len as u64).saturating_mul(8));
    saturate(bits.saturating_mul(1_000_000) / params.bit_rate_bps as u64)
}

/// Time on air of an LR-FHSS frame, in microseconds.
pub fn lr_fhss_time_on_air_us(params: &LrFhssParams, len: usize) -> u32 {
    let len = len as u64;
    let coded_bits = match params.coding_rate {
        LrFhssCodingRate::_5_6 => len.saturating_mul(6).saturating_add(4) / 5,
        LrFhssCodingRate::_2_3 => len.saturating_mul(3) / 2,
        LrFhssCodingRate::_1_2 => len.saturating_mul(2),
        LrFhssCodingRate::_1_3 => len.saturating_mul(3),
    };

    let mut payload_bits = (coded_bits / LR_FHSS_BLOCK_CODED_BITS).saturating_mul(LR_FHSS_BLOCK_AIR_BITS);
    let remainder = coded_bits % LR_FHSS_BLOCK_CODED_BITS;
    if remainder != 0 {
        payload_bits = payload_bits.saturating_add(remainder + LR_FHSS_BLOCK_PADDING_BITS);
    }

    let total_bits = (LR_FHSS_HEADER_BITS * params.header_count as u64).saturating_add(payload_bits);
    // Float to integer casts saturate
    (total_bits.saturating_mul(8 * 1_000_000) as f32 / LR_FHSS_BIT_RATE) as u32
}

/// Time on air of a frame of `len` payload bytes, in microseconds.
pub fn time_on_air_us(modulation: &ModulationConfig, packet: &PacketConfig, len: usize) -> u32 {
    match modulation {
        ModulationConfig::LoRa(params) => lora_time_on_air_us(params, packet, len),
        ModulationConfig::Fsk(params) => fsk_time_on_air_us(params, packet, len),
        ModulationConfig::LrFhss(params) => lr_fhss_time_on_air_us(params, len),
    }
}

/// Airtime and the software timeout guarding one operation.
///
/// Always computed from the current configuration; never keep one across a configuration change.
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingBudget {
    /// Expected time on air in microseconds
    pub time_on_air_us: u32,
    /// Time after which the operation is abandoned, in microseconds
    pub timeout_us: u32,
}

impl TimingBudget {
    /// Budget for transmitting `len` bytes.
    ///
    /// LoRa completion is signalled precisely, so 1.5x the airtime suffices; FSK and LR-FHSS
    /// get 5x.
    pub fn transmit(modulation: &ModulationConfig, packet: &PacketConfig, len: usize) -> Self {
        let time_on_air_us = time_on_air_us(modulation, packet, len);
        let timeout_us = match modulation {
            ModulationConfig::LoRa(_) => time_on_air_us.saturating_add(time_on_air_us / 2),
            ModulationConfig::Fsk(_) | ModulationConfig::LrFhss(_) => time_on_air_us.saturating_mul(5),
        };
        Self {
            time_on_air_us,
            timeout_us,
        }
    }

    /// Budget for receiving a frame of `expected_len` bytes, or of the largest frame when unknown.
    pub fn receive(modulation: &ModulationConfig, packet: &PacketConfig, expected_len: Option<usize>) -> Self {
        let len = match expected_len {
            Some(len) if len > 0 => len,
            _ => MAX_PAYLOAD_LENGTH,
        };
        let time_on_air_us = time_on_air_us(modulation, packet, len);
        let timeout_us = match modulation {
            ModulationConfig::LoRa(_) => time_on_air_us.saturating_mul(5),
            ModulationConfig::Fsk(_) | ModulationConfig::LrFhss(_) => time_on_air_us.saturating_mul(10),
        };
        Self {
            time_on_air_us,
            timeout_us,
        }
    }
}
