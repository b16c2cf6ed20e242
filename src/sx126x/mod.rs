mod radio_kind_params;

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::*;
pub use radio_kind_params::TcxoCtrlVoltage;
use radio_kind_params::*;

use crate::interface::{SpiInterface, TransactionConfig};
use crate::irq::IrqMap;
use crate::mod_params::*;
use crate::mod_traits::{InterfaceVariant, ModeRequest, RadioKind};
use crate::profile::{ChipProfile, Identity, ResetSequence};
mod variant;
pub use variant::*;

#[cfg(test)]
mod test;

// Internal frequency of the radio
const SX126X_XTAL_FREQ: u32 = 32000000;

// Scaling factor used to perform fixed-point operations
const SX126X_PLL_STEP_SHIFT_AMOUNT: u32 = 14;

// PLL step - scaled with SX126X_PLL_STEP_SHIFT_AMOUNT
const SX126X_PLL_STEP_SCALED: u32 = SX126X_XTAL_FREQ >> (25 - SX126X_PLL_STEP_SHIFT_AMOUNT);

// Time required for the TCXO to wakeup [ms].
const BRD_TCXO_WAKEUP_TIME: u32 = 10;

// SetRx timeout argument for enabling continuous mode
const RX_CONTINUOUS_TIMEOUT: u32 = 0xffffff;

// Largest finite SetRx timeout, in 15.625 us steps
const RX_MAX_TIMEOUT: u32 = 0xfffffe;

// Longest time BUSY may stay asserted; calibration of all blocks takes about 3.5 ms
const BUSY_TIMEOUT_US: u32 = 20_000;

const TRANSACTION: TransactionConfig = TransactionConfig {
    command_width: 8,
    address_width: 16,
    status_width: 8,
    stream: true,
    status_pos: 1,
    read_command: OpCode::ReadRegister as u16,
    write_command: OpCode::WriteRegister as u16,
    nop: 0x00,
    busy_timeout_us: Some(BUSY_TIMEOUT_US),
    parse_status: Some(parse_status),
};

// IrqEvent::ALL order: every event has its own bit
const IRQ_MAP: IrqMap = IrqMap::new([
    Some(0),
    Some(1),
    Some(2),
    Some(3),
    Some(4),
    Some(5),
    Some(6),
    Some(7),
    Some(8),
    Some(9),
]);

const IDENTITY: Identity = Identity {
    address: Register::Version as u32,
    len: 16,
    expected: &[b"SX126"],
};

const RESET: ResetSequence = ResetSequence {
    before_ms: 10,
    asserted_ms: 20,
    settle_ms: 10,
};

const SX126X_BASE: ChipProfile = ChipProfile {
    name: "sx126x",
    transaction: TRANSACTION,
    irq_map: IRQ_MAP,
    identity: IDENTITY,
    reset: RESET,
    modems: &[Modem::LoRa, Modem::Fsk],
    frequency_range: (150_000_000, 960_000_000),
    output_power_range: (-9, 22),
    current_limit_range: (0, 140),
    max_payload_len: 255,
    rx_duty_cycle: true,
};

/// Sx1261 description
pub static SX1261_PROFILE: ChipProfile = ChipProfile {
    name: "sx1261",
    output_power_range: (-17, 15),
    ..SX126X_BASE
};

/// Sx1262 description
pub static SX1262_PROFILE: ChipProfile = ChipProfile {
    name: "sx1262",
    ..SX126X_BASE
};

/// Sx1268 description
pub static SX1268_PROFILE: ChipProfile = ChipProfile {
    name: "sx1268",
    frequency_range: (410_000_000, 810_000_000),
    ..SX126X_BASE
};

/// Power amplifier selection
#[repr(u8)]
pub enum DeviceSel {
    /// Low power, power amplifier, used by sx1261
    LowPowerPA = 1,
    /// High power, power amplifier, used by sx1262
    HighPowerPA = 0,
}

/// Configuration for SX126x-based boards
pub struct Config<C: Sx126xVariant + Sized> {
    /// LoRa chip variant on this board
    pub chip: C,
    /// Board is using TCXO (once enabled DIO3 cannot be used as IRQ)
    pub tcxo_ctrl: Option<TcxoCtrlVoltage>,
    /// Whether board is using optional DCDC in addition to LDO
    pub use_dcdc: bool,
    /// Whether to boost receive
    pub rx_boost: bool,
}

/// Base for the RadioKind implementation for the LoRa chip kind and board type
pub struct Sx126x<SPI, IV, C: Sx126xVariant + Sized> {
    intf: SpiInterface<SPI, IV>,
    config: Config<C>,
    // Image calibration currently applied
    calibrated_band: Option<[u8; 2]>,
}

impl<SPI, IV, C> Sx126x<SPI, IV, C>
where
    SPI: SpiDevice<u8>,
    IV: InterfaceVariant,
    C: Sx126xVariant,
{
    /// Create an instance of the RadioKind implementation for the LoRa chip kind and board type
    pub fn new(spi: SPI, iv: IV, config: Config<C>) -> Self {
        let intf = SpiInterface::new(spi, iv, TRANSACTION);
        Self {
            intf,
            config,
            calibrated_band: None,
        }
    }

    async fn read_register(&mut self, register: Register) -> Result<u8, RadioError> {
        let mut value = [0x00u8];
        self.intf.read(register.addr(), &mut value).await?;
        Ok(value[0])
    }

    async fn write_register(&mut self, register: Register, value: u8) -> Result<(), RadioError> {
        self.intf.write(register.addr(), &[value]).await
    }

    async fn set_pa_config(&mut self, pa_duty_cycle: u8, hp_max: u8, device_sel: DeviceSel) -> Result<(), RadioError> {
        const PA_LUT_RESERVED: u8 = 0x01;
        self.intf
            .command_write(
                OpCode::SetPAConfig.value(),
                &[pa_duty_cycle, hp_max, device_sel as u8, PA_LUT_RESERVED],
            )
            .await
    }

    fn timeout_bytes(timeout: u32) -> [u8; 3] {
        [
            ((timeout >> 16) & 0xFF) as u8,
            ((timeout >> 8) & 0xFF) as u8,
            (timeout & 0xFF) as u8,
        ]
    }

    // Each step is 15.625 us (1/64th ms)
    fn rx_timeout_steps(timeout_us: Option<u32>) -> u32 {
        match timeout_us {
            None => RX_CONTINUOUS_TIMEOUT,
            Some(us) => ((us as u64 * 64 / 1000) as u32).clamp(1, RX_MAX_TIMEOUT),
        }
    }

    fn convert_freq_in_hz_to_pll_step(freq_in_hz: u32) -> u32 {
        // Get integer and fractional parts of the frequency computed with a PLL step scaled value
        let steps_int = freq_in_hz / SX126X_PLL_STEP_SCALED;
        let steps_frac = freq_in_hz - (steps_int * SX126X_PLL_STEP_SCALED);

        (steps_int << SX126X_PLL_STEP_SHIFT_AMOUNT)
            + (((steps_frac << SX126X_PLL_STEP_SHIFT_AMOUNT) + (SX126X_PLL_STEP_SCALED >> 1)) / SX126X_PLL_STEP_SCALED)
    }

    fn image_calibration_band(frequency_in_hz: u32) -> [u8; 2] {
        if frequency_in_hz > 900000000 {
            [0xE1, 0xE9]
        } else if frequency_in_hz > 850000000 {
            [0xD7, 0xDB]
        } else if frequency_in_hz > 770000000 {
            [0xC1, 0xC5]
        } else if frequency_in_hz > 460000000 {
            [0x75, 0x81]
        } else {
            [0x6B, 0x6F]
        }
    }

    // Calibrate the image rejection for the band holding the given frequency
    async fn calibrate_image(&mut self, frequency_in_hz: u32) -> Result<(), RadioError> {
        let band = Self::image_calibration_band(frequency_in_hz);
        if self.calibrated_band == Some(band) {
            return Ok(());
        }
        self.intf.command_write(OpCode::CalibrateImage.value(), &band).await?;
        self.calibrated_band = Some(band);
        Ok(())
    }

    async fn set_rx_gain(&mut self) -> Result<(), RadioError> {
        // if Rx boosted, set max LNA gain, increase current by ~2mA for around ~3dB in sensitivity
        let rx_gain = if self.config.rx_boost { 0x96 } else { 0x94 };
        self.write_register(Register::RxGain, rx_gain).await
    }

    async fn set_lora_sync_word(&mut self, sync_word: &SyncWord) -> Result<(), RadioError> {
        // 0x34 is written as 0x3444 and 0x12 as 0x1424
        let value = sync_word.value[0];
        let word = [(value & 0xF0) | 0x04, ((value & 0x0F) << 4) | 0x04];
        self.intf.write(Register::LoRaSyncword.addr(), &word).await
    }

    async fn set_lora_modulation(&mut self, params: &LoRaParams) -> Result<(), RadioError> {
        let spreading_factor_val = spreading_factor_value(params.spreading_factor);
        let bandwidth_val = bandwidth_value(params.bandwidth);
        let coding_rate_val = coding_rate_value(params.coding_rate);
        debug!(
            "sf = {}, bw = {}, cr = {}",
            spreading_factor_val, bandwidth_val, coding_rate_val
        );
        self.intf
            .command_write(
                OpCode::SetModulationParams.value(),
                &[
                    spreading_factor_val,
                    bandwidth_val,
                    coding_rate_val,
                    params.ldro_enabled() as u8,
                ],
            )
            .await?;

        // Handle modulation quality with the 500 kHz LoRa bandwidth (see DS_SX1261-2_V1.2 datasheet chapter 15.1)
        let tx_mod = self.read_register(Register::TxModulation).await?;
        let tx_mod = if params.bandwidth == Bandwidth::_500KHz {
            tx_mod & !(1 << 2)
        } else {
            tx_mod | (1 << 2)
        };
        self.write_register(Register::TxModulation, tx_mod).await
    }

    async fn set_gfsk_modulation(&mut self, params: &FskParams) -> Result<(), RadioError> {
        let bit_rate = (32 * SX126X_XTAL_FREQ) / params.bit_rate_bps;
        let deviation = ((params.frequency_deviation_hz as u64) << 25) / SX126X_XTAL_FREQ as u64;
        let [_, br_1, br_2, br_3] = bit_rate.to_be_bytes();
        let [_, fdev_1, fdev_2, fdev_3] = (deviation as u32).to_be_bytes();
        self.intf
            .command_write(
                OpCode::SetModulationParams.value(),
                &[
                    br_1,
                    br_2,
                    br_3,
                    pulse_shape_value(params.pulse_shape),
                    gfsk_rx_bandwidth_value(params.rx_bandwidth_hz)?,
                    fdev_1,
                    fdev_2,
                    fdev_3,
                ],
            )
            .await
    }
}

impl<SPI, IV, C> RadioKind for Sx126x<SPI, IV, C>
where
    SPI: SpiDevice<u8>,
    IV: InterfaceVariant,
    C: Sx126xVariant,
{
    type Spi = SPI;
    type Iv = IV;

    fn profile(&self) -> &'static ChipProfile {
        self.config.chip.profile()
    }

    fn interface(&mut self) -> &mut SpiInterface<SPI, IV> {
        &mut self.intf
    }

    async fn wait_ready(&mut self, _delay: &mut impl DelayNs) -> Result<(), RadioError> {
        self.intf.wait_on_busy().await
    }

    async fn init(&mut self, _delay: &mut impl DelayNs) -> Result<(), RadioError> {
        self.calibrated_band = None;
        // DC-DC regulator setup (default is LDO)
        if self.config.use_dcdc {
            self.intf
                .command_write(OpCode::SetRegulatorMode.value(), &[RegulatorMode::UseDCDC.value()])
                .await?;
        }
        // DIO2 acting as RF Switch (default is DIO2 as IRQ)
        if self.config.chip.use_dio2_as_rfswitch() {
            self.intf
                .command_write(OpCode::SetDIO2AsRfSwitchCtrl.value(), &[0x01])
                .await?;
        }

        // DIO3 acting as TCXO controller (default is DIO3 as IRQ)
        if let Some(voltage) = self.config.tcxo_ctrl {
            // When TCXO is used, XOSC_START_ERR flag is raised at POR or at
            // wake-up from Sleep mode in cold-start condition. This is an
            // expected behaviour since chip is not yet aware of being clocked
            // by TCXO and therefore this should be initially cleared manually.
            self.intf
                .command_write(OpCode::ClearDeviceErrors.value(), &[0x00, 0x00])
                .await?;

            // Each unit is 15.625uS (which is 1/64th ms)
            let [t1, t2, t3] = Self::timeout_bytes(BRD_TCXO_WAKEUP_TIME << 6);
            self.intf
                .command_write(OpCode::SetTCXOMode.value(), &[voltage.value() & 0x07, t1, t2, t3])
                .await?;
            // Re-run calibration now that chip knows that it's running from TCXO
            self.intf.command_write(OpCode::Calibrate.value(), &[0b0111_1111]).await?;
        }

        self.intf
            .command_write(OpCode::SetBufferBaseAddress.value(), &[0x00, 0x00])
            .await
    }

    async fn set_standby(&mut self, clock: StandbyClock) -> Result<(), RadioError> {
        self.intf
            .command_write(OpCode::SetStandby.value(), &[standby_value(clock)])
            .await
    }

    async fn set_sleep(&mut self, delay: &mut impl DelayNs) -> Result<(), RadioError> {
        let sleep_params = SleepParams {
            wakeup_rtc: false,
            reset: false,
            warm_start: true,
        };
        self.intf
            .command_sleep(OpCode::SetSleep.value(), &[sleep_params.value()])
            .await?;
        delay.delay_ms(2).await;
        Ok(())
    }

    async fn set_frequency_synthesis(&mut self) -> Result<(), RadioError> {
        self.intf.command_write(OpCode::SetFS.value(), &[]).await
    }

    async fn set_modulation(&mut self, modulation: &ModulationConfig, packet: &PacketConfig) -> Result<(), RadioError> {
        match modulation {
            ModulationConfig::LoRa(params) => {
                self.intf
                    .command_write(OpCode::SetPacketType.value(), &[PacketType::LoRa.value()])
                    .await?;
                self.set_lora_modulation(params).await?;
                self.set_lora_sync_word(&packet.sync_word).await?;
            }
            ModulationConfig::Fsk(params) => {
                self.intf
                    .command_write(OpCode::SetPacketType.value(), &[PacketType::GFSK.value()])
                    .await?;
                self.set_gfsk_modulation(params).await?;
                self.intf
                    .write(Register::Syncword.addr(), packet.sync_word.bytes())
                    .await?;
            }
            ModulationConfig::LrFhss(_) => return Err(RadioError::UnsupportedModem(Modem::LrFhss)),
        }
        self.set_packet_params(modulation, packet, MAX_PAYLOAD_LENGTH as u8).await
    }

    async fn set_frequency(&mut self, frequency_in_hz: u32) -> Result<(), RadioError> {
        debug!("channel = {}", frequency_in_hz);
        self.calibrate_image(frequency_in_hz).await?;
        let freq_in_pll_steps = Self::convert_freq_in_hz_to_pll_step(frequency_in_hz);
        self.intf
            .command_write(OpCode::SetRFFrequency.value(), &freq_in_pll_steps.to_be_bytes())
            .await
    }

    // Over current protection uses the default set automatically by SetPAConfig
    async fn set_output_power(&mut self, output_power: i8) -> Result<(), RadioError> {
        let tx_params_power = match self.config.chip.get_device_sel() {
            DeviceSel::LowPowerPA => {
                // From Table 13-21: PA Operating Modes with Optimal Settings
                match output_power {
                    15.. => {
                        self.set_pa_config(0x06, 0x00, DeviceSel::LowPowerPA).await?;
                        14
                    }
                    11..=14 => {
                        self.set_pa_config(0x04, 0x00, DeviceSel::LowPowerPA).await?;
                        output_power
                    }
                    // 10 and less
                    _ => {
                        self.set_pa_config(0x01, 0x00, DeviceSel::LowPowerPA).await?;
                        // table indicates 10 dBm => txp = 13, therefore we add 3 to values below 10
                        output_power + 3
                    }
                }
            }
            DeviceSel::HighPowerPA => {
                // Provide better resistance of the SX1262 Tx to antenna mismatch (see DS_SX1261-2_V1.2 datasheet chapter 15.2)
                let tx_clamp_cfg = self.read_register(Register::TxClampCfg).await? | (0x0F << 1);
                self.write_register(Register::TxClampCfg, tx_clamp_cfg).await?;

                // From Table 13-21: PA Operating Modes with Optimal Settings
                match output_power {
                    21.. => {
                        self.set_pa_config(0x04, 0x07, DeviceSel::HighPowerPA).await?;
                        output_power
                    }
                    18..=20 => {
                        self.set_pa_config(0x03, 0x05, DeviceSel::HighPowerPA).await?;
                        // table indicates 20 dBm => txp = 22, therefore we add 2 to this range
                        output_power + 2
                    }
                    15..=17 => {
                        self.set_pa_config(0x02, 0x03, DeviceSel::HighPowerPA).await?;
                        // table indicates 17 dBm => txp = 22, therefore we add 5 to this range
                        output_power + 5
                    }
                    _ => {
                        self.set_pa_config(0x02, 0x02, DeviceSel::HighPowerPA).await?;
                        // table indicates 14 dBm => txp = 22, therefore we add 8 to this range
                        output_power + 8
                    }
                }
            }
        };
        self.intf
            .command_write(
                OpCode::SetTxParams.value(),
                &[tx_params_power as u8, RampTime::Ramp40Us.value()],
            )
            .await
    }

    async fn set_packet_params(
        &mut self,
        modulation: &ModulationConfig,
        packet: &PacketConfig,
        payload_len: u8,
    ) -> Result<(), RadioError> {
        match modulation {
            ModulationConfig::LoRa(params) => {
                let mut preamble_length = packet.preamble_length;
                if params.spreading_factor <= SpreadingFactor::_6 && preamble_length < 12 {
                    preamble_length = 12;
                }
                let [pre_1, pre_2] = preamble_length.to_be_bytes();
                self.intf
                    .command_write(
                        OpCode::SetPacketParams.value(),
                        &[
                            pre_1,
                            pre_2,
                            packet.implicit_header as u8,
                            payload_len,
                            packet.crc.is_on() as u8,
                            packet.iq_inverted as u8,
                        ],
                    )
                    .await?;

                // Optimize Inverted IQ Operation, otherwise packet loss with longer packets might occur.
                let iq_polarity = self.read_register(Register::IQPolarity).await?;
                let iq_polarity = if packet.iq_inverted {
                    iq_polarity & !(1 << 2)
                } else {
                    iq_polarity | (1 << 2)
                };
                self.write_register(Register::IQPolarity, iq_polarity).await
            }
            ModulationConfig::Fsk(_) => {
                let [pre_1, pre_2] = packet.preamble_length.to_be_bytes();
                self.intf
                    .command_write(
                        OpCode::SetPacketParams.value(),
                        &[
                            pre_1,
                            pre_2,
                            GFSK_PREAMBLE_DETECTOR_8_BITS,
                            packet.sync_word.len_bits,
                            0x00, // no address filtering
                            !packet.implicit_header as u8,
                            payload_len,
                            gfsk_crc_value(packet.crc),
                            packet.whitening as u8,
                        ],
                    )
                    .await
            }
            ModulationConfig::LrFhss(_) => Err(RadioError::UnsupportedModem(Modem::LrFhss)),
        }
    }

    async fn write_payload(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.intf
            .command_write_data(OpCode::WriteBuffer.value(), &[0x00], payload)
            .await
    }

    async fn arm(
        &mut self,
        request: &ModeRequest,
        irq_mask: u32,
        modulation: &ModulationConfig,
    ) -> Result<(), RadioError> {
        match (request, modulation) {
            (ModeRequest::Transmit, _) => {}
            (ModeRequest::Receive { .. } | ModeRequest::ReceiveDutyCycle(_), _) => {
                // Stop the Rx timer on preamble detection
                self.intf
                    .command_write(OpCode::SetStopRxTimerOnPreamble.value(), &[0x01])
                    .await?;
                if let ModulationConfig::LoRa(_) = modulation {
                    // Timing is left to the SetRx timeout
                    self.intf
                        .command_write(OpCode::SetLoRaSymbTimeout.value(), &[0x00])
                        .await?;
                }
                self.set_rx_gain().await?;
            }
            (ModeRequest::ChannelScan, ModulationConfig::LoRa(params)) => {
                self.set_rx_gain().await?;
                // See:
                //  https://lora-developers.semtech.com/documentation/tech-papers-and-guides/channel-activity-detection-ensuring-your-lora-packets-are-sent/how-to-ensure-your-lora-packets-are-sent-properly
                // for default values used here.
                let spreading_factor_val = spreading_factor_value(params.spreading_factor);
                self.intf
                    .command_write(
                        OpCode::SetCADParams.value(),
                        &[
                            CADSymbols::_8.value(),      // number of symbols for detection
                            spreading_factor_val + 13u8, // limit for detection of SNR peak
                            10u8,                        // minimum symbol recognition
                            0x00u8, // CAD exit mode without listen-before-send or subsequent receive processing
                            0x00u8, // no timeout
                            0x00u8,
                            0x00u8,
                        ],
                    )
                    .await?;
            }
            (ModeRequest::ChannelScan, _) => return Err(RadioError::Unsupported),
        }

        // Every armed event is routed to DIO1
        let [_, _, mask_1, mask_2] = irq_mask.to_be_bytes();
        self.intf
            .command_write(
                OpCode::CfgDIOIrq.value(),
                &[mask_1, mask_2, mask_1, mask_2, 0x00, 0x00, 0x00, 0x00],
            )
            .await
    }

    async fn launch(&mut self, request: &ModeRequest) -> Result<(), RadioError> {
        match request {
            // The software budget bounds transmission, so the chip timeout stays disabled
            ModeRequest::Transmit => {
                self.intf
                    .command_write(OpCode::SetTx.value(), &Self::timeout_bytes(0))
                    .await
            }
            ModeRequest::Receive { timeout_us } => {
                let steps = Self::rx_timeout_steps(*timeout_us);
                self.intf
                    .command_write(OpCode::SetRx.value(), &Self::timeout_bytes(steps))
                    .await
            }
            ModeRequest::ReceiveDutyCycle(cycle) => {
                let rx = Self::timeout_bytes(Self::rx_timeout_steps(Some(cycle.rx_period_us)));
                let sleep = Self::timeout_bytes(Self::rx_timeout_steps(Some(cycle.sleep_period_us)));
                self.intf
                    .command_write(
                        OpCode::SetRxDutyCycle.value(),
                        &[rx[0], rx[1], rx[2], sleep[0], sleep[1], sleep[2]],
                    )
                    .await
            }
            ModeRequest::ChannelScan => self.intf.command_write(OpCode::SetCAD.value(), &[]).await,
        }
    }

    async fn irq_flags(&mut self) -> Result<u32, RadioError> {
        let mut irq_status = [0x00u8; 2];
        self.intf
            .command_read(OpCode::GetIrqStatus.value(), &[], &mut irq_status)
            .await?;
        Ok(u16::from_be_bytes(irq_status) as u32)
    }

    async fn clear_irq_flags(&mut self, mask: u32) -> Result<(), RadioError> {
        let [_, _, mask_1, mask_2] = mask.to_be_bytes();
        self.intf
            .command_write(OpCode::ClrIrqStatus.value(), &[mask_1, mask_2])
            .await
    }

    async fn read_payload(&mut self, packet: &PacketConfig, buffer: &mut [u8]) -> Result<usize, RadioError> {
        let mut rx_buffer_status = [0x00u8; 2];
        self.intf
            .command_read(OpCode::GetRxBufferStatus.value(), &[], &mut rx_buffer_status)
            .await?;
        let [mut payload_length, offset] = rx_buffer_status;

        if packet.implicit_header {
            payload_length = self.read_register(Register::PayloadLength).await?;
            // implicit header mode timeout behavior (see DS_SX1261-2_V1.2 datasheet chapter 15.3)
            self.write_register(Register::RTCCtrl, 0x00).await?;
            let evt_clr = self.read_register(Register::EvtClr).await? | (1 << 1);
            self.write_register(Register::EvtClr, evt_clr).await?;
        }

        let payload_length = payload_length as usize;
        if payload_length > buffer.len() {
            return Err(RadioError::PayloadSizeUnexpected(payload_length));
        }
        self.intf
            .command_read(OpCode::ReadBuffer.value(), &[offset], &mut buffer[..payload_length])
            .await?;
        Ok(payload_length)
    }

    async fn packet_status(&mut self, modulation: &ModulationConfig) -> Result<PacketStatus, RadioError> {
        let mut pkt_status = [0x00u8; 3];
        self.intf
            .command_read(OpCode::GetPacketStatus.value(), &[], &mut pkt_status)
            .await?;
        match modulation {
            ModulationConfig::LoRa(_) => Ok(PacketStatus {
                rssi: -(pkt_status[0] as i16) / 2,
                snr: Some((pkt_status[1] as i8) as i16 / 4),
            }),
            // RxStatus, RssiSync, RssiAvg
            _ => Ok(PacketStatus {
                rssi: -(pkt_status[2] as i16) / 2,
                snr: None,
            }),
        }
    }

    async fn set_current_limit(&mut self, milliamps: u16) -> Result<(), RadioError> {
        // 2.5 mA steps
        self.write_register(Register::Ocp, (milliamps.saturating_mul(2) / 5) as u8).await
    }

    // Sampled with the LNA and mixer off so only noise reaches the demodulator
    async fn random_number(&mut self) -> Result<u32, RadioError> {
        let ana_lna = self.read_register(Register::AnaLNA).await?;
        self.write_register(Register::AnaLNA, ana_lna & !(1 << 0)).await?;
        let ana_mixer = self.read_register(Register::AnaMixer).await?;
        self.write_register(Register::AnaMixer, ana_mixer & !(1 << 7)).await?;

        // Continuous Rx with no interrupts routed
        self.intf
            .command_write(OpCode::CfgDIOIrq.value(), &[0x00; 8])
            .await?;
        self.intf
            .command_write(OpCode::SetRx.value(), &Self::timeout_bytes(RX_CONTINUOUS_TIMEOUT))
            .await?;
        let mut number = [0x00u8; 4];
        self.intf.read(Register::RandomNumber.addr(), &mut number).await?;
        self.set_standby(StandbyClock::Rc).await?;

        self.write_register(Register::AnaLNA, ana_lna).await?;
        self.write_register(Register::AnaMixer, ana_mixer).await?;
        Ok(u32::from_be_bytes(number))
    }

    async fn frequency_error(&mut self, modulation: &ModulationConfig) -> Result<i32, RadioError> {
        let ModulationConfig::LoRa(params) = modulation else {
            return Err(RadioError::WrongModem);
        };
        let mut raw = [0x00u8; 3];
        self.intf.read(Register::FreqError.addr(), &mut raw).await?;
        let raw = u32::from_be_bytes([0, raw[0], raw[1], raw[2]]) & 0x0F_FFFF;
        // 20 bit two's complement
        let efe = if raw & 0x08_0000 != 0 {
            raw as i64 - 0x10_0000
        } else {
            raw as i64
        };
        Ok((efe * params.bandwidth.hz() as i64 * 31 / 32_000_000) as i32)
    }

    async fn transmit_continuous_wave(&mut self) -> Result<(), RadioError> {
        self.intf
            .command_write(OpCode::SetTxContinuousWave.value(), &[])
            .await
    }

    fn validate(&self, modulation: &ModulationConfig, packet: &PacketConfig) -> Result<(), RadioError> {
        match modulation {
            ModulationConfig::LoRa(_) => {
                if packet.sync_word.len_bits != 8 {
                    return Err(RadioError::InvalidSyncWord);
                }
            }
            ModulationConfig::Fsk(params) => {
                if packet.sync_word.len_bits == 0 || packet.sync_word.len_bits > 64 {
                    return Err(RadioError::InvalidSyncWord);
                }
                if !(600..=300_000).contains(&params.bit_rate_bps) {
                    return Err(RadioError::Unsupported);
                }
                gfsk_rx_bandwidth_value(params.rx_bandwidth_hz)?;
            }
            ModulationConfig::LrFhss(_) => return Err(RadioError::UnsupportedModem(Modem::LrFhss)),
        }
        Ok(())
    }
}
