use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::SpiDevice;

use crate::interface::SpiInterface;
use crate::mod_params::*;
use crate::profile::ChipProfile;

/// Functions implemented for an embedded framework for an MCU/LoRa chip combination
/// to allow this crate to control the LoRa chip.
pub trait InterfaceVariant {
    /// Drive the reset line; `true` holds the chip in reset
    fn set_reset(&mut self, asserted: bool) -> Result<(), RadioError>;
    /// Level of the BUSY line; boards without one report `false`
    fn busy_asserted(&mut self) -> Result<bool, RadioError>;
    /// Level of the line signalling completion of the armed operation
    fn irq_asserted(&mut self) -> Result<bool, RadioError>;
    /// Monotonic clock in microseconds, allowed to wrap
    fn now_micros(&mut self) -> u32;
    /// Give the host scheduler a chance to run; called on every poll iteration
    async fn yield_now(&mut self) {
        embassy_futures::yield_now().await
    }
    /// Move the external antenna switch
    async fn set_rf_switch(&mut self, state: RfSwitchState) -> Result<(), RadioError>;
    /// Observe one completed SPI transaction
    fn on_transaction(&mut self, _out: &[u8], _in: &[u8]) {}
}

/// A request prepared by [`crate::Radio::stage`] and consumed by [`crate::Radio::launch`]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    /// Start transmitting the loaded payload
    Transmit,
    /// Start receiving; `timeout_us` of `None` selects continuous reception
    Receive {
        /// Hardware timeout in microseconds
        timeout_us: Option<u32>,
    },
    /// Start receiving in windows separated by sleep, until a frame arrives
    ReceiveDutyCycle(DutyCycle),
    /// Start channel activity detection
    ChannelScan,
}

impl ModeRequest {
    /// Mode the radio enters when the request is launched
    pub fn radio_mode(&self) -> RadioMode {
        match self {
            ModeRequest::Transmit => RadioMode::Transmit,
            ModeRequest::Receive { .. } | ModeRequest::ReceiveDutyCycle(_) => RadioMode::Receive,
            ModeRequest::ChannelScan => RadioMode::ChannelActivityDetection,
        }
    }
}

/// Functions implemented for a specific kind of chip family, used by [`crate::Radio`].
///
/// Implementations only move bytes: validation, interrupt translation and timing live in the
/// controller, and interrupt masks arrive already translated to chip bits.
pub trait RadioKind {
    /// Bus used to talk to the chip
    type Spi: SpiDevice<u8>;
    /// Board glue for reset, busy, interrupt and RF switch lines
    type Iv: InterfaceVariant;

    /// Static description of the chip
    fn profile(&self) -> &'static ChipProfile;
    /// Register transaction layer
    fn interface(&mut self) -> &mut SpiInterface<Self::Spi, Self::Iv>;

    /// Wait for the chip to accept commands after a reset
    async fn wait_ready(&mut self, delay: &mut impl DelayNs) -> Result<(), RadioError>;
    /// One time setup after identification: regulator, oscillator, calibration, buffer bases
    async fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), RadioError>;
    /// Enter standby on the given oscillator
    async fn set_standby(&mut self, clock: StandbyClock) -> Result<(), RadioError>;
    /// Enter sleep; the chip keeps its configuration
    async fn set_sleep(&mut self, delay: &mut impl DelayNs) -> Result<(), RadioError>;
    /// Lock the synthesizer without starting Tx or Rx
    async fn set_frequency_synthesis(&mut self) -> Result<(), RadioError>;
    /// Select the modem and write its complete parameter block
    async fn set_modulation(&mut self, modulation: &ModulationConfig, packet: &PacketConfig) -> Result<(), RadioError>;
    /// Tune the carrier
    async fn set_frequency(&mut self, frequency_in_hz: u32) -> Result<(), RadioError>;
    /// Set transmit power in dBm
    async fn set_output_power(&mut self, output_power: i8) -> Result<(), RadioError>;
    /// Write framing for a frame of `payload_len` bytes
    async fn set_packet_params(
        &mut self,
        modulation: &ModulationConfig,
        packet: &PacketConfig,
        payload_len: u8,
    ) -> Result<(), RadioError>;
    /// Load the transmit buffer
    async fn write_payload(&mut self, payload: &[u8]) -> Result<(), RadioError>;
    /// Route the given chip interrupt bits to the completion line for `request`
    async fn arm(
        &mut self,
        request: &ModeRequest,
        irq_mask: u32,
        modulation: &ModulationConfig,
    ) -> Result<(), RadioError>;
    /// Issue the single command starting `request`
    async fn launch(&mut self, request: &ModeRequest) -> Result<(), RadioError>;
    /// Read pending interrupt bits
    async fn irq_flags(&mut self) -> Result<u32, RadioError>;
    /// Clear the given interrupt bits
    async fn clear_irq_flags(&mut self, mask: u32) -> Result<(), RadioError>;
    /// Copy the last received frame into `buffer`, returning its length
    async fn read_payload(&mut self, packet: &PacketConfig, buffer: &mut [u8]) -> Result<usize, RadioError>;
    /// Signal quality of the last received frame
    async fn packet_status(&mut self, modulation: &ModulationConfig) -> Result<PacketStatus, RadioError>;
    /// Transmit an unmodulated carrier until the next mode change
    async fn transmit_continuous_wave(&mut self) -> Result<(), RadioError> {
        Err(RadioError::Unsupported)
    }
    /// Check family specific constraints of a configuration
    fn validate(&self, _modulation: &ModulationConfig, _packet: &PacketConfig) -> Result<(), RadioError> {
        Ok(())
    }
    /// Check an output power against what the board's amplifier path can deliver
    fn check_output_power(&self, output_power: i8) -> Result<(), RadioError> {
        self.profile().check_output_power(output_power)
    }
    /// Limit the power amplifier supply current
    async fn set_current_limit(&mut self, _milliamps: u16) -> Result<(), RadioError> {
        Err(RadioError::Unsupported)
    }
    /// Sample wideband noise into a 32 bit value; leaves the chip in standby
    async fn random_number(&mut self) -> Result<u32, RadioError> {
        Err(RadioError::Unsupported)
    }
    /// Carrier offset of the last received LoRa frame in Hz
    async fn frequency_error(&mut self, _modulation: &ModulationConfig) -> Result<i32, RadioError> {
        Err(RadioError::Unsupported)
    }
}

/// The contract offered to a protocol layer (for instance a LoRaWAN MAC) above the radio.
pub trait PhysicalLayer {
    /// Send `data` and wait for completion
    async fn transmit(&mut self, data: &[u8]) -> Result<(), RadioError>;
    /// Wait for a frame, copying it into `buffer`; returns its length
    async fn receive(&mut self, buffer: &mut [u8], timeout: RxTimeout) -> Result<usize, RadioError>;
    /// Start sending `data` without waiting
    async fn start_transmit(&mut self, data: &[u8]) -> Result<(), RadioError>;
    /// Clean up after a transmission started with [`PhysicalLayer::start_transmit`]
    async fn finish_transmit(&mut self) -> Result<(), RadioError>;
    /// Start listening without waiting
    async fn start_receive(&mut self, config: RxConfig) -> Result<(), RadioError>;
    /// Collect the frame of a reception started with [`PhysicalLayer::start_receive`]
    async fn finish_receive(&mut self, buffer: &mut [u8]) -> Result<usize, RadioError>;
    /// Run channel activity detection and wait for the result
    async fn scan_channel(&mut self) -> Result<ChannelScanResult, RadioError>;
    /// Start channel activity detection without waiting
    async fn start_channel_scan(&mut self) -> Result<(), RadioError>;
    /// Outcome of a detection started with [`PhysicalLayer::start_channel_scan`]
    async fn get_channel_scan_result(&mut self) -> Result<ChannelScanResult, RadioError>;
    /// Tune the carrier
    async fn set_frequency(&mut self, frequency_in_hz: u32) -> Result<(), RadioError>;
    /// LoRa bandwidth
    async fn set_bandwidth(&mut self, bandwidth: Bandwidth) -> Result<(), RadioError>;
    /// LoRa spreading factor
    async fn set_spreading_factor(&mut self, spreading_factor: SpreadingFactor) -> Result<(), RadioError>;
    /// LoRa coding rate
    async fn set_coding_rate(&mut self, coding_rate: CodingRate) -> Result<(), RadioError>;
    /// Transmit power in dBm
    async fn set_output_power(&mut self, output_power: i8) -> Result<(), RadioError>;
    /// Preamble length in symbols (LoRa) or bits (FSK)
    async fn set_preamble_length(&mut self, preamble_length: u16) -> Result<(), RadioError>;
    /// Airtime of a `len` byte frame in microseconds
    fn get_time_on_air(&self, len: usize) -> u32;
    /// RSSI of the last received frame in dBm
    async fn get_rssi(&mut self) -> Result<i16, RadioError>;
    /// SNR of the last received frame in dB
    async fn get_snr(&mut self) -> Result<i16, RadioError>;
    /// Program a pending operation without starting it
    async fn stage(&mut self, config: ModeConfig<'_>) -> Result<(), RadioError>;
    /// Start the staged operation
    async fn launch(&mut self) -> Result<(), RadioError>;
}
