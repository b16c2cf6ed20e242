#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!(feature_label = r#"<span class="stab portability"><code>{feature}</code></span>"#)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

/// Bounded chip identification after reset
pub mod detect;
/// The read/write interface between an embedded framework/MCU combination and a radio chip
pub mod interface;
/// Logical interrupt events and their translation to chip bits
pub mod irq;
/// InterfaceVariant implementations using `embedded-hal`.
pub mod iv;
/// Parameters used across the rf-phy crate to support various use cases
pub mod mod_params;
/// Traits implemented externally or internally to support control of radio chips
pub mod mod_traits;
mod phy;
/// Static chip descriptions
pub mod profile;
/// Specific implementation to support Semtech Sx126x chips
pub mod sx126x;
/// Specific implementation to support Semtech Sx127x chips
pub mod sx127x;

#[cfg(test)]
mod test_util;

pub use embedded_hal_async::delay::DelayNs;
use irq::*;
use mod_params::*;
use mod_traits::*;

pub use crate::interface::SpiInterface;
pub use crate::mod_traits::{InterfaceVariant, PhysicalLayer, RadioKind};

// Symbols covered by a channel activity detection, with margin
const CAD_BUDGET_SYMBOLS: u32 = 16;

// Preamble symbols a duty cycled receiver must hear before it commits to a frame
const DUTY_CYCLE_MIN_SYMBOLS: u16 = 8;
// Sleep to listen transition of the chip
const DUTY_CYCLE_WAKEUP_US: u32 = 1016;

// Wide LoRa bandwidths are only specified above 400 MHz
fn check_bandwidth(modulation: &ModulationConfig, frequency_in_hz: u32) -> Result<(), RadioError> {
    match modulation {
        ModulationConfig::LoRa(params)
            if matches!(params.bandwidth, Bandwidth::_250KHz | Bandwidth::_500KHz) && frequency_in_hz < 400_000_000 =>
        {
            Err(RadioError::InvalidBandwidthForFrequency)
        }
        _ => Ok(()),
    }
}

#[derive(Clone, Copy)]
struct Pending {
    request: ModeRequest,
    budget_us: Option<u32>,
    len: usize,
}

#[derive(Clone, Copy)]
struct Running {
    pending: Pending,
    started_at: u32,
}

/// Provides the physical layer API to support radio chips
pub struct Radio<RK, DLY>
where
    RK: RadioKind,
    DLY: DelayNs,
{
    radio_kind: RK,
    delay: DLY,
    irq: IrqTranslator,
    modulation: ModulationConfig,
    packet: PacketConfig,
    frequency_in_hz: u32,
    output_power: i8,
    current_limit_ma: Option<u16>,
    radio_mode: RadioMode,
    staged: Option<Pending>,
    running: Option<Running>,
    data_rate: Option<u32>,
    packet_length: Option<usize>,
}

impl<RK, DLY> Radio<RK, DLY>
where
    RK: RadioKind,
    DLY: DelayNs,
{
    /// Identify the chip, initialize it and apply `config`.
    ///
    /// Fails with [`RadioError::DeviceNotFound`] when the chip does not identify itself within
    /// [`detect::ATTEMPTS`] resets.
    pub async fn new(mut radio_kind: RK, mut delay: DLY, config: RadioConfig) -> Result<Self, RadioError> {
        detect::find_chip(&mut radio_kind, &mut delay).await?;
        let irq = IrqTranslator::new(radio_kind.profile().irq_map);
        let mut radio = Self {
            radio_kind,
            delay,
            irq,
            modulation: config.modulation,
            packet: config.packet,
            frequency_in_hz: config.frequency_in_hz,
            output_power: config.output_power,
            current_limit_ma: None,
            radio_mode: RadioMode::Sleep,
            staged: None,
            running: None,
            data_rate: None,
            packet_length: None,
        };
        radio.standby(StandbyClock::Rc).await?;
        radio.radio_kind.init(&mut radio.delay).await?;
        radio.configure(config).await?;
        Ok(radio)
    }

    /// Apply a complete configuration: modem, framing, carrier and power
    pub async fn configure(&mut self, config: RadioConfig) -> Result<(), RadioError> {
        self.radio_kind.profile().check_frequency(config.frequency_in_hz)?;
        self.radio_kind.check_output_power(config.output_power)?;
        self.check_modem(config.modulation.modem())?;
        // Modulation and carrier change together, so check them as a pair
        check_bandwidth(&config.modulation, config.frequency_in_hz)?;
        self.write_modulation(config.modulation, config.packet).await?;
        self.write_frequency(config.frequency_in_hz).await?;
        self.set_output_power(config.output_power).await
    }

    fn check_modem(&self, modem: Modem) -> Result<(), RadioError> {
        if self.radio_kind.profile().supports(modem) {
            Ok(())
        } else {
            Err(RadioError::UnsupportedModem(modem))
        }
    }

    /// Switch modem, or rewrite the parameters of the active one
    pub async fn set_modulation(&mut self, modulation: ModulationConfig, packet: PacketConfig) -> Result<(), RadioError> {
        self.check_modem(modulation.modem())?;
        self.apply(modulation, packet).await
    }

    async fn apply(&mut self, modulation: ModulationConfig, packet: PacketConfig) -> Result<(), RadioError> {
        check_bandwidth(&modulation, self.frequency_in_hz)?;
        self.write_modulation(modulation, packet).await
    }

    async fn write_modulation(&mut self, modulation: ModulationConfig, packet: PacketConfig) -> Result<(), RadioError> {
        self.radio_kind.validate(&modulation, &packet)?;
        self.radio_kind.set_modulation(&modulation, &packet).await?;
        self.modulation = modulation;
        self.packet = packet;
        // Anything staged was timed for the old parameters
        self.staged = None;
        Ok(())
    }

    async fn update_lora(&mut self, update: impl FnOnce(&mut LoRaParams)) -> Result<(), RadioError> {
        let ModulationConfig::LoRa(mut params) = self.modulation else {
            return Err(RadioError::WrongModem);
        };
        update(&mut params);
        self.apply(ModulationConfig::LoRa(params), self.packet).await
    }

    /// Tune the carrier
    pub async fn set_frequency(&mut self, frequency_in_hz: u32) -> Result<(), RadioError> {
        self.radio_kind.profile().check_frequency(frequency_in_hz)?;
        check_bandwidth(&self.modulation, frequency_in_hz)?;
        self.write_frequency(frequency_in_hz).await
    }

    async fn write_frequency(&mut self, frequency_in_hz: u32) -> Result<(), RadioError> {
        self.radio_kind.set_frequency(frequency_in_hz).await?;
        self.frequency_in_hz = frequency_in_hz;
        Ok(())
    }

    /// Set the LoRa bandwidth
    pub async fn set_bandwidth(&mut self, bandwidth: Bandwidth) -> Result<(), RadioError> {
        self.update_lora(|params| params.bandwidth = bandwidth).await
    }

    /// Set the LoRa spreading factor
    pub async fn set_spreading_factor(&mut self, spreading_factor: SpreadingFactor) -> Result<(), RadioError> {
        self.update_lora(|params| params.spreading_factor = spreading_factor).await
    }

    /// Set the LoRa coding rate
    pub async fn set_coding_rate(&mut self, coding_rate: CodingRate) -> Result<(), RadioError> {
        self.update_lora(|params| params.coding_rate = coding_rate).await
    }

    /// Set the transmit power in dBm.
    ///
    /// The accepted range depends on the amplifier path the board wires to the antenna.
    pub async fn set_output_power(&mut self, output_power: i8) -> Result<(), RadioError> {
        self.radio_kind.check_output_power(output_power)?;
        self.radio_kind.set_output_power(output_power).await?;
        self.output_power = output_power;
        // Amplifier setup restores the default current limit
        if let Some(milliamps) = self.current_limit_ma {
            self.radio_kind.set_current_limit(milliamps).await?;
        }
        Ok(())
    }

    /// Limit the power amplifier supply current, in mA; kept across output power changes
    pub async fn set_current_limit(&mut self, milliamps: u16) -> Result<(), RadioError> {
        self.radio_kind.profile().check_current_limit(milliamps)?;
        self.radio_kind.set_current_limit(milliamps).await?;
        self.current_limit_ma = Some(milliamps);
        Ok(())
    }

    /// Set the preamble length: symbols for LoRa, bits for FSK
    pub async fn set_preamble_length(&mut self, preamble_length: u16) -> Result<(), RadioError> {
        match self.modulation {
            ModulationConfig::LoRa(_) | ModulationConfig::Fsk(_) => {}
            ModulationConfig::LrFhss(_) => return Err(RadioError::WrongModem),
        }
        if preamble_length == 0 {
            return Err(RadioError::InvalidPreambleLength(preamble_length));
        }
        let packet = PacketConfig {
            preamble_length,
            ..self.packet
        };
        self.apply(self.modulation, packet).await
    }

    /// Active modem parameters
    pub fn modulation(&self) -> &ModulationConfig {
        &self.modulation
    }

    /// Active framing
    pub fn packet_config(&self) -> &PacketConfig {
        &self.packet
    }

    /// Carrier frequency in Hz
    pub fn frequency(&self) -> u32 {
        self.frequency_in_hz
    }

    /// Transmit power in dBm
    pub fn output_power(&self) -> i8 {
        self.output_power
    }

    /// Current state of the radio
    pub fn mode(&self) -> RadioMode {
        self.radio_mode
    }

    /// Airtime of a `len` byte frame with the active configuration, in microseconds
    pub fn time_on_air(&self, len: usize) -> u32 {
        time_on_air_us(&self.modulation, &self.packet, len)
    }

    /// Payload bits per second of the last completed transmission, measured from launch to
    /// completion
    pub fn measured_data_rate(&self) -> Option<u32> {
        self.data_rate
    }

    /// Length of the last received frame
    pub fn packet_length(&self) -> Option<usize> {
        self.packet_length
    }

    /// RSSI and SNR of the last received frame
    pub async fn packet_status(&mut self) -> Result<PacketStatus, RadioError> {
        self.radio_kind.packet_status(&self.modulation).await
    }

    /// Carrier offset of the last received LoRa frame in Hz
    pub async fn frequency_error(&mut self) -> Result<i32, RadioError> {
        if self.modulation.modem() != Modem::LoRa {
            return Err(RadioError::WrongModem);
        }
        self.radio_kind.frequency_error(&self.modulation).await
    }

    /// Chip bit raising `event`, or [`IrqLine::NotSupported`] when this chip has no such event
    pub fn resolve_irq(&self, event: IrqEvent) -> IrqLine {
        self.irq.resolve(event)
    }

    /// Pending logical events
    pub async fn irq_events(&mut self) -> Result<IrqEventSet, RadioError> {
        let flags = self.radio_kind.irq_flags().await?;
        Ok(self.irq.from_chip(flags))
    }

    /// Whether `event` is pending; [`RadioError::UnsupportedEvent`] when the chip cannot raise it
    pub async fn check_irq(&mut self, event: IrqEvent) -> Result<bool, RadioError> {
        let mask = self.irq.require(event)?;
        Ok(self.radio_kind.irq_flags().await? & mask != 0)
    }

    /// Clear the supported events in `events`
    pub async fn clear_irq(&mut self, events: IrqEventSet) -> Result<(), RadioError> {
        let mask = self.irq.to_chip(events);
        if mask == 0 {
            return Ok(());
        }
        self.radio_kind.clear_irq_flags(mask).await
    }

    /// 32 bits sampled from wideband noise. Not uniformly distributed; whiten before use as
    /// key material. Anything staged is dropped.
    pub async fn random_number(&mut self) -> Result<u32, RadioError> {
        self.staged = None;
        self.standby(StandbyClock::Rc).await?;
        let number = self.radio_kind.random_number().await;
        self.transition(RadioMode::Standby(StandbyClock::Rc)).await?;
        number
    }

    /// One byte sampled from wideband noise, see [`Radio::random_number`]
    pub async fn random_byte(&mut self) -> Result<u8, RadioError> {
        Ok(self.random_number().await?.to_le_bytes()[0])
    }

    /// Record a new mode and move the antenna switch to match it
    async fn transition(&mut self, mode: RadioMode) -> Result<(), RadioError> {
        self.radio_kind.interface().iv().set_rf_switch(mode.into()).await?;
        debug!("radio mode {:?} -> {:?}", self.radio_mode, mode);
        self.radio_mode = mode;
        Ok(())
    }

    /// Put the radio in low power mode; configuration is retained
    pub async fn sleep(&mut self) -> Result<(), RadioError> {
        self.staged = None;
        self.running = None;
        if self.radio_mode != RadioMode::Sleep {
            self.radio_kind.set_sleep(&mut self.delay).await?;
            self.transition(RadioMode::Sleep).await?;
        }
        Ok(())
    }

    /// Enter standby on the given oscillator, ending any running operation
    pub async fn standby(&mut self, clock: StandbyClock) -> Result<(), RadioError> {
        self.running = None;
        self.radio_kind.set_standby(clock).await?;
        self.transition(RadioMode::Standby(clock)).await
    }

    /// Lock the synthesizer on the carrier without transmitting or receiving
    pub async fn frequency_synthesis(&mut self) -> Result<(), RadioError> {
        self.running = None;
        self.radio_kind.set_frequency_synthesis().await?;
        self.transition(RadioMode::FrequencySynthesis).await
    }

    /// Transmit an unmodulated carrier at the configured frequency until the next mode change,
    /// generally for regulatory testing
    pub async fn transmit_direct(&mut self) -> Result<(), RadioError> {
        self.staged = None;
        self.standby(StandbyClock::Rc).await?;
        self.transition(RadioMode::Transmit).await?;
        if let Err(err) = self.radio_kind.transmit_continuous_wave().await {
            self.transition(RadioMode::Standby(StandbyClock::Rc)).await?;
            return Err(err);
        }
        Ok(())
    }

    fn check_payload_len(&self, len: usize) -> Result<(), RadioError> {
        if len > self.radio_kind.profile().max_payload_len {
            Err(RadioError::PayloadSizeUnexpected(len))
        } else {
            Ok(())
        }
    }

    /// Program a transmit, receive or channel scan without starting it.
    ///
    /// The payload, framing and interrupt routing are written to the chip so that
    /// [`Radio::launch`] only issues the final command. Staging again replaces the previous
    /// request.
    pub async fn stage(&mut self, config: ModeConfig<'_>) -> Result<(), RadioError> {
        self.staged = None;
        let modem = self.modulation.modem();
        if !self.radio_kind.profile().supports(modem) {
            return Err(RadioError::UnsupportedModem(modem));
        }

        let (pending, irq_mask, payload) = match config {
            ModeConfig::Transmit(payload) => {
                self.check_payload_len(payload.len())?;
                let budget = TimingBudget::transmit(&self.modulation, &self.packet, payload.len());
                let mask = self.irq.require(IrqEvent::TxDone)? | self.irq.to_chip(IrqEvent::Timeout.into());
                let pending = Pending {
                    request: ModeRequest::Transmit,
                    budget_us: Some(budget.timeout_us),
                    len: payload.len(),
                };
                (pending, mask, Some(payload))
            }
            ModeConfig::Receive(rx) => {
                let max = self.radio_kind.profile().max_payload_len;
                let len = rx.expected_len.filter(|len| *len > 0).unwrap_or(max);
                self.check_payload_len(len)?;
                let (timeout_us, budget_us) = self.receive_timeouts(rx);
                let pending = Pending {
                    request: ModeRequest::Receive { timeout_us },
                    budget_us,
                    len,
                };
                (pending, self.receive_mask()?, None)
            }
            ModeConfig::ReceiveDutyCycle(cycle) => {
                if !self.radio_kind.profile().rx_duty_cycle {
                    return Err(RadioError::Unsupported);
                }
                // Ends with a frame or the caller, like continuous reception
                let pending = Pending {
                    request: ModeRequest::ReceiveDutyCycle(cycle),
                    budget_us: None,
                    len: self.radio_kind.profile().max_payload_len,
                };
                (pending, self.receive_mask()?, None)
            }
            ModeConfig::ChannelScan => {
                let ModulationConfig::LoRa(params) = self.modulation else {
                    return Err(RadioError::Unsupported);
                };
                let mask = self.irq.require(IrqEvent::CadDone)? | self.irq.to_chip(IrqEvent::CadDetected.into());
                let pending = Pending {
                    request: ModeRequest::ChannelScan,
                    budget_us: Some(params.symbol_duration_us().saturating_mul(CAD_BUDGET_SYMBOLS)),
                    len: 0,
                };
                (pending, mask, None)
            }
        };

        self.standby(StandbyClock::Rc).await?;
        self.radio_kind
            .set_packet_params(&self.modulation, &self.packet, pending.len as u8)
            .await?;
        self.radio_kind.arm(&pending.request, irq_mask, &self.modulation).await?;
        self.radio_kind.clear_irq_flags(self.irq.all()).await?;
        if let Some(payload) = payload {
            self.radio_kind.write_payload(payload).await?;
        }
        trace!("staged {:?}", pending.request);
        self.staged = Some(pending);
        Ok(())
    }

    fn receive_mask(&self) -> Result<u32, RadioError> {
        Ok(self.irq.require(IrqEvent::RxDone)?
            | self.irq.to_chip(IrqEventSet::of(&[
                IrqEvent::Timeout,
                IrqEvent::CrcError,
                IrqEvent::HeaderError,
            ])))
    }

    // Hardware timeout and software budget of a receive
    fn receive_timeouts(&self, rx: RxConfig) -> (Option<u32>, Option<u32>) {
        let budget = TimingBudget::receive(&self.modulation, &self.packet, rx.expected_len);
        let timeout_us = match rx.timeout {
            RxTimeout::Never => return (None, None),
            RxTimeout::Default => budget.timeout_us,
            RxTimeout::After(us) => us,
        }
        .max(1);
        // A frame whose preamble arrives just before the hardware timeout still has to finish
        (Some(timeout_us), Some(timeout_us.saturating_add(budget.time_on_air_us)))
    }

    /// Start the staged operation; returns as soon as the chip has accepted the command.
    ///
    /// The staged request is consumed even when the command fails. Returns
    /// [`RadioError::NothingStaged`] without touching the chip when nothing is staged.
    pub async fn launch(&mut self) -> Result<(), RadioError> {
        let Some(pending) = self.staged.take() else {
            return Err(RadioError::NothingStaged);
        };
        self.transition(pending.request.radio_mode()).await?;
        if let Err(err) = self.radio_kind.launch(&pending.request).await {
            self.transition(RadioMode::Standby(StandbyClock::Rc)).await?;
            return Err(err);
        }
        let started_at = self.radio_kind.interface().iv().now_micros();
        self.running = Some(Running { pending, started_at });
        Ok(())
    }

    // Poll the completion line until an armed event is raised or the budget runs out
    async fn complete(&mut self) -> Result<(Running, IrqEventSet), RadioError> {
        let Some(running) = self.running.take() else {
            return Err(RadioError::NothingStaged);
        };
        loop {
            if self.radio_kind.interface().iv().irq_asserted()? {
                let flags = self.radio_kind.irq_flags().await?;
                let events = self.irq.from_chip(flags);
                if !events.is_empty() {
                    self.radio_kind.clear_irq_flags(flags).await?;
                    trace!("irq events {:?}", events);
                    return Ok((running, events));
                }
            }
            if let Some(budget_us) = running.pending.budget_us {
                let now = self.radio_kind.interface().iv().now_micros();
                if now.wrapping_sub(running.started_at) >= budget_us {
                    warn!("{:?} exceeded its {} us budget", running.pending.request, budget_us);
                    return Err(self.abort(&running.pending.request).await);
                }
            }
            self.radio_kind.interface().iv().yield_now().await;
        }
    }

    // Silence the front end and drop pending interrupts, then report the timeout of `request`
    async fn abort(&mut self, request: &ModeRequest) -> RadioError {
        if let Err(err) = self.silence().await {
            return err;
        }
        match request {
            ModeRequest::Transmit => RadioError::TransmitTimeout,
            ModeRequest::Receive { .. } | ModeRequest::ReceiveDutyCycle(_) => RadioError::ReceiveTimeout,
            ModeRequest::ChannelScan => RadioError::ChannelScanTimeout,
        }
    }

    async fn silence(&mut self) -> Result<(), RadioError> {
        self.standby(StandbyClock::Rc).await?;
        self.radio_kind.clear_irq_flags(self.irq.all()).await
    }

    /// Wait for a launched transmission to complete
    pub async fn finish_transmit(&mut self) -> Result<(), RadioError> {
        let (running, events) = self.complete().await?;
        if !events.contains(IrqEvent::TxDone) {
            return Err(self.abort(&running.pending.request).await);
        }
        let elapsed_us = self
            .radio_kind
            .interface()
            .iv()
            .now_micros()
            .wrapping_sub(running.started_at);
        self.data_rate = match elapsed_us {
            0 => None,
            elapsed_us => Some((running.pending.len as u64 * 8 * 1_000_000 / elapsed_us as u64) as u32),
        };
        self.transition(RadioMode::Standby(StandbyClock::Rc)).await
    }

    /// Wait for a launched reception and copy the frame into `buffer`, returning its length.
    ///
    /// A frame failing its CRC is still copied out; the returned
    /// [`RadioError::CrcMismatch`] carries its length.
    pub async fn finish_receive(&mut self, buffer: &mut [u8]) -> Result<usize, RadioError> {
        let (running, events) = self.complete().await?;
        if !events.contains(IrqEvent::RxDone) {
            if events.contains(IrqEvent::HeaderError) {
                self.silence().await?;
                return Err(RadioError::HeaderError);
            }
            return Err(self.abort(&running.pending.request).await);
        }

        let continuous = matches!(running.pending.request, ModeRequest::Receive { timeout_us: None });
        if continuous {
            // The chip keeps listening; the next frame can be collected with another call
            let started_at = self.radio_kind.interface().iv().now_micros();
            self.running = Some(Running { started_at, ..running });
        } else {
            self.transition(RadioMode::Standby(StandbyClock::Rc)).await?;
        }

        let len = self.radio_kind.read_payload(&self.packet, buffer).await?;
        self.packet_length = Some(len);
        if events.contains(IrqEvent::CrcError) {
            warn!("received {} bytes with a CRC error", len);
            return Err(RadioError::CrcMismatch(len));
        }
        Ok(len)
    }

    /// Wait for a launched channel activity detection and report whether the channel is busy
    pub async fn get_channel_scan_result(&mut self) -> Result<ChannelScanResult, RadioError> {
        let (running, events) = self.complete().await?;
        if !events.contains(IrqEvent::CadDone) {
            return Err(self.abort(&running.pending.request).await);
        }
        self.transition(RadioMode::Standby(StandbyClock::Rc)).await?;
        if events.contains(IrqEvent::CadDetected) {
            Ok(ChannelScanResult::Detected)
        } else {
            Ok(ChannelScanResult::Free)
        }
    }

    /// Start sending `data` without waiting for completion
    pub async fn start_transmit(&mut self, data: &[u8]) -> Result<(), RadioError> {
        self.stage(ModeConfig::Transmit(data)).await?;
        self.launch().await
    }

    /// Send `data` and wait until it has left the antenna
    pub async fn transmit(&mut self, data: &[u8]) -> Result<(), RadioError> {
        self.start_transmit(data).await?;
        self.finish_transmit().await
    }

    /// Start listening without waiting for a frame
    pub async fn start_receive(&mut self, config: RxConfig) -> Result<(), RadioError> {
        self.stage(ModeConfig::Receive(config)).await?;
        self.launch().await
    }

    /// Wait for one frame of at most `buffer.len()` bytes
    pub async fn receive(&mut self, buffer: &mut [u8], timeout: RxTimeout) -> Result<usize, RadioError> {
        // A buffer larger than any frame only bounds the copy
        let config = RxConfig {
            timeout,
            expected_len: Some(buffer.len().min(self.radio_kind.profile().max_payload_len)),
        };
        self.start_receive(config).await?;
        self.finish_receive(buffer).await
    }

    /// Start listening in `cycle.rx_period_us` windows separated by `cycle.sleep_period_us` of
    /// sleep; collect the frame with [`Radio::finish_receive`]
    pub async fn start_receive_duty_cycle(&mut self, cycle: DutyCycle) -> Result<(), RadioError> {
        self.stage(ModeConfig::ReceiveDutyCycle(cycle)).await?;
        self.launch().await
    }

    /// Start a LoRa receive duty cycle that cannot miss a frame sent with a
    /// `sender_preamble_len` symbol preamble, listening for at least `min_symbols` of it.
    ///
    /// Zero selects the configured preamble length and 8 symbols respectively. Falls back to
    /// continuous reception when the preamble is too short to sleep through.
    pub async fn start_receive_duty_cycle_auto(
        &mut self,
        sender_preamble_len: u16,
        min_symbols: u16,
    ) -> Result<(), RadioError> {
        let ModulationConfig::LoRa(params) = self.modulation else {
            return Err(RadioError::WrongModem);
        };
        let preamble = match sender_preamble_len {
            0 => self.packet.preamble_length,
            len => len,
        } as u32;
        let min_symbols = match min_symbols {
            0 => DUTY_CYCLE_MIN_SYMBOLS,
            symbols => symbols,
        } as u32;
        let continuous = RxConfig {
            timeout: RxTimeout::Never,
            expected_len: None,
        };
        // The window may open just too late to catch min_symbols, so the next must still see them
        if 2 * min_symbols > preamble {
            return self.start_receive(continuous).await;
        }

        let symbol_us = params.symbol_duration_us();
        let sleep_period_us = symbol_us.saturating_mul(preamble - 2 * min_symbols);
        if sleep_period_us < DUTY_CYCLE_WAKEUP_US {
            return self.start_receive(continuous).await;
        }
        // A detected preamble holds the chip awake for sleep + 2 * rx, which has to outlast it
        let rx_period_us = (symbol_us.saturating_mul(preamble + 1).saturating_sub(sleep_period_us - 1000) / 2)
            .max(symbol_us.saturating_mul(min_symbols + 1));
        self.start_receive_duty_cycle(DutyCycle {
            rx_period_us,
            sleep_period_us,
        })
        .await
    }

    /// Start a channel activity detection without waiting for its result
    pub async fn start_channel_scan(&mut self) -> Result<(), RadioError> {
        self.stage(ModeConfig::ChannelScan).await?;
        self.launch().await
    }

    /// Run a channel activity detection and wait for its result
    pub async fn scan_channel(&mut self) -> Result<ChannelScanResult, RadioError> {
        self.start_channel_scan().await?;
        self.get_channel_scan_result().await
    }

    /// RSSI of the last received frame in dBm
    pub async fn get_rssi(&mut self) -> Result<i16, RadioError> {
        Ok(self.packet_status().await?.rssi)
    }

    /// SNR of the last received LoRa frame in dB
    pub async fn get_snr(&mut self) -> Result<i16, RadioError> {
        if self.modulation.modem() != Modem::LoRa {
            return Err(RadioError::WrongModem);
        }
        self.packet_status().await?.snr.ok_or(RadioError::Unsupported)
    }
}
