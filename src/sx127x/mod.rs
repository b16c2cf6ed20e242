mod radio_kind_params;

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::*;
use radio_kind_params::*;

use crate::interface::{SpiInterface, TransactionConfig};
use crate::irq::IrqMap;
use crate::mod_params::*;
use crate::mod_traits::{InterfaceVariant, ModeRequest, RadioKind};
use crate::profile::{ChipProfile, Identity, ResetSequence};

// TCXO flag
const TCXO_FOR_OSCILLATOR: u8 = 0x10u8;

// Limits for preamble detection window in single reception mode
const SX127X_MIN_LORA_SYMB_NUM_TIMEOUT: u32 = 4;
const SX127X_MAX_LORA_SYMB_NUM_TIMEOUT: u32 = 1023;

// Constant values need to compute the RSSI value
const SX1276_RSSI_OFFSET_LF: i16 = -164;
const SX1276_RSSI_OFFSET_HF: i16 = -157;
const SX1276_RF_MID_BAND_THRESH: u32 = 525_000_000;

const SX127X_XTAL_FREQ: u64 = 32_000_000;

const TRANSACTION: TransactionConfig = TransactionConfig {
    command_width: 0,
    address_width: 8,
    status_width: 0,
    stream: false,
    status_pos: 0,
    read_command: 0x00,
    write_command: 0x80,
    nop: 0x00,
    busy_timeout_us: None,
    parse_status: None,
};

// RegIrqFlags: CadDetected 0, FhssChangeChannel 1, CadDone 2, TxDone 3, ValidHeader 4,
// PayloadCrcError 5, RxDone 6, RxTimeout 7. No preamble, sync word or header error flags.
const IRQ_MAP: IrqMap = IrqMap::new([
    Some(3),
    Some(6),
    None,
    None,
    Some(4),
    None,
    Some(5),
    Some(2),
    Some(0),
    Some(7),
]);

const IDENTITY: Identity = Identity {
    address: Register::RegVersion as u32,
    len: 1,
    expected: &[&[0x12]],
};

const RESET: ResetSequence = ResetSequence {
    before_ms: 10,
    asserted_ms: 10,
    settle_ms: 10,
};

/// Sx1276 description; the sx1277/78/79 share its silicon and register map
pub static SX1276_PROFILE: ChipProfile = ChipProfile {
    name: "sx1276",
    transaction: TRANSACTION,
    irq_map: IRQ_MAP,
    identity: IDENTITY,
    reset: RESET,
    modems: &[Modem::LoRa],
    frequency_range: (137_000_000, 1_020_000_000),
    output_power_range: (-4, 20),
    current_limit_range: (45, 240),
    max_payload_len: 255,
    rx_duty_cycle: false,
};

fn freq_to_pll_step(freq_in_hz: u32) -> u32 {
    // FRF = freq * 2^19 / FXOSC
    (((freq_in_hz as u64) << 19) / SX127X_XTAL_FREQ) as u32
}

// RSSI requires linearization when SNR >= 0
// Section 3.5.5 - Note 3
fn linearize_rssi(rssi: u8) -> i16 {
    // Integer approximation for RSSI * 16.0 / 15.0
    // General formula for integer division with rounding:
    // x / d == floor((x + floor(d / 2)) / d), when d > 0
    const DIVISOR: i16 = 15;
    (rssi as i16 * 16 + (DIVISOR / 2)) / DIVISOR
}

/// Implement this trait on your custom variant or use provided impls
pub trait Sx127xVariant {
    /// Static description of the part
    fn profile(&self) -> &'static ChipProfile;
}

/// Sx1276, also covering the sx1277/78/79
pub struct Sx1276;

impl Sx127xVariant for Sx1276 {
    fn profile(&self) -> &'static ChipProfile {
        &SX1276_PROFILE
    }
}

/// Configuration for SX127x-based boards
pub struct Config<C: Sx127xVariant> {
    /// LoRa chip used on specific board
    pub chip: C,
    /// Whether board is using crystal oscillator or external clock
    pub tcxo_used: bool,
    /// Whether to use PA_BOOST for transmit instead of RFO.
    /// NB! Depends on board layout.
    pub tx_boost: bool,
    /// Whether to boost receive
    pub rx_boost: bool,
}

/// Base for the RadioKind implementation for the LoRa chip kind and board type
pub struct Sx127x<SPI, IV, C: Sx127xVariant + Sized> {
    intf: SpiInterface<SPI, IV>,
    config: Config<C>,
    // Receive mode chosen when the reception was armed
    rx_mode: LoRaMode,
    frequency_in_hz: u32,
}

impl<SPI, IV, C> Sx127x<SPI, IV, C>
where
    SPI: SpiDevice<u8>,
    IV: InterfaceVariant,
    C: Sx127xVariant,
{
    /// Create an instance of the RadioKind implementation for the LoRa chip kind and board type
    pub fn new(spi: SPI, iv: IV, config: Config<C>) -> Self {
        let intf = SpiInterface::new(spi, iv, TRANSACTION);
        Self {
            intf,
            config,
            rx_mode: LoRaMode::RxContinuous,
            frequency_in_hz: 0,
        }
    }

    // Utility functions
    async fn write_register(&mut self, register: Register, value: u8) -> Result<(), RadioError> {
        self.intf.write(register.addr(), &[value]).await
    }

    async fn read_register(&mut self, register: Register) -> Result<u8, RadioError> {
        let mut value = [0x00u8];
        self.intf.read(register.addr(), &mut value).await?;
        Ok(value[0])
    }

    async fn set_mode(&mut self, mode: LoRaMode) -> Result<(), RadioError> {
        self.write_register(Register::RegOpMode, mode.value()).await
    }

    // Set the number of symbols the radio will wait to detect a reception (up to 1023 symbols)
    async fn set_lora_symbol_num_timeout(&mut self, symbol_num: u32) -> Result<(), RadioError> {
        let val = symbol_num.clamp(SX127X_MIN_LORA_SYMB_NUM_TIMEOUT, SX127X_MAX_LORA_SYMB_NUM_TIMEOUT);

        let symbol_num_msb = ((val >> 8) & 0x03) as u8;
        let symbol_num_lsb = (val & 0xff) as u8;
        let mut config_2 = self.read_register(Register::RegModemConfig2).await?;
        config_2 = (config_2 & 0xfcu8) | symbol_num_msb;
        self.write_register(Register::RegModemConfig2, config_2).await?;
        self.write_register(Register::RegSymbTimeoutLsb, symbol_num_lsb).await
    }

    async fn set_lna(&mut self) -> Result<(), RadioError> {
        let lna_gain = if self.config.rx_boost {
            LnaGain::G1.boosted_value()
        } else {
            LnaGain::G1.value()
        };
        self.write_register(Register::RegLna, lna_gain).await
    }

    // Route one of RxDone, TxDone or CadDone to DIO0
    async fn set_dio0(&mut self, mapping: DioMapping1Dio0) -> Result<(), RadioError> {
        let dio_mapping_1 = self.read_register(Register::RegDioMapping1).await?;
        let dio_mapping_1 = (dio_mapping_1 & DioMapping1Dio0::Mask.value()) | mapping.value();
        self.write_register(Register::RegDioMapping1, dio_mapping_1).await
    }

    fn rssi_offset(&self) -> i16 {
        if self.frequency_in_hz > SX1276_RF_MID_BAND_THRESH {
            SX1276_RSSI_OFFSET_HF
        } else {
            SX1276_RSSI_OFFSET_LF
        }
    }
}

impl<SPI, IV, C> RadioKind for Sx127x<SPI, IV, C>
where
    SPI: SpiDevice<u8>,
    IV: InterfaceVariant,
    C: Sx127xVariant,
{
    type Spi = SPI;
    type Iv = IV;

    fn profile(&self) -> &'static ChipProfile {
        self.config.chip.profile()
    }

    fn interface(&mut self) -> &mut SpiInterface<SPI, IV> {
        &mut self.intf
    }

    // No BUSY line; the settle time of the reset sequence is all the chip needs
    async fn wait_ready(&mut self, _delay: &mut impl DelayNs) -> Result<(), RadioError> {
        Ok(())
    }

    async fn init(&mut self, _delay: &mut impl DelayNs) -> Result<(), RadioError> {
        // The LoRa mode bit can only be changed in sleep
        self.set_mode(LoRaMode::Sleep).await?;
        if self.config.tcxo_used {
            self.write_register(Register::RegTcxo, TCXO_FOR_OSCILLATOR).await?;
        }
        self.write_register(Register::RegFifoTxBaseAddr, 0x00).await?;
        self.write_register(Register::RegFifoRxBaseAddr, 0x00).await?;
        self.write_register(Register::RegMaxPayloadLength, 0xff).await?;
        self.set_mode(LoRaMode::Standby).await
    }

    // The sx127x standby always runs on the crystal
    async fn set_standby(&mut self, _clock: StandbyClock) -> Result<(), RadioError> {
        self.set_mode(LoRaMode::Standby).await
    }

    // Warm start is unavailable for sx127x
    async fn set_sleep(&mut self, _delay: &mut impl DelayNs) -> Result<(), RadioError> {
        self.set_mode(LoRaMode::Sleep).await
    }

    async fn set_frequency_synthesis(&mut self) -> Result<(), RadioError> {
        self.set_mode(LoRaMode::FsTx).await
    }

    async fn set_modulation(&mut self, modulation: &ModulationConfig, packet: &PacketConfig) -> Result<(), RadioError> {
        let ModulationConfig::LoRa(params) = modulation else {
            return Err(RadioError::UnsupportedModem(modulation.modem()));
        };
        debug!(
            "sf = {}, bw = {}, cr_denom = {}",
            params.spreading_factor.value(),
            bandwidth_value(params.bandwidth),
            params.coding_rate.denominator()
        );

        // Configure LoRa optimization (0x31) and detection threshold registers (0x37)
        let (opt, thr) = match params.spreading_factor {
            SpreadingFactor::_6 => (0x05, 0x0c),
            _ => (0x03, 0x0a),
        };
        let reg_val = self.read_register(Register::RegDetectionOptimize).await?;
        // Keep reserved bits [6:3] for RegDetectOptimize
        let val = (reg_val & 0b0111_1000) | opt;
        self.write_register(Register::RegDetectionOptimize, val).await?;
        self.write_register(Register::RegDetectionThreshold, thr).await?;

        // LDRO on, AGC auto off; gain is set explicitly through RegLna
        let config_3 = if params.ldro_enabled() { 0x08u8 } else { 0x00u8 };
        self.write_register(Register::RegModemConfig3, config_3).await?;
        self.write_register(Register::RegSyncWord, packet.sync_word.value[0])
            .await?;

        self.set_packet_params(modulation, packet, MAX_PAYLOAD_LENGTH as u8)
            .await
    }

    async fn set_frequency(&mut self, frequency_in_hz: u32) -> Result<(), RadioError> {
        debug!("channel = {}", frequency_in_hz);
        let [_, frf_msb, frf_mid, frf_lsb] = freq_to_pll_step(frequency_in_hz).to_be_bytes();
        self.intf
            .write(Register::RegFrfMsb.addr(), &[frf_msb, frf_mid, frf_lsb])
            .await?;
        self.frequency_in_hz = frequency_in_hz;
        Ok(())
    }

    async fn set_output_power(&mut self, output_power: i8) -> Result<(), RadioError> {
        debug!("tx power = {}", output_power);
        if self.config.tx_boost {
            let txp = output_power;
            if txp > 17 {
                // The +20 dBm DAC adds 3 dB: Pout = 5 + OutputPower
                self.write_register(Register::RegPaDac, PaDac::_20DbmOn.value()).await?;
                self.write_register(Register::RegOcp, OcpTrim::_240Ma.value()).await?;
                self.write_register(Register::RegPaConfig, PaConfig::PaBoost.value() | (txp - 5) as u8)
                    .await?;
            } else {
                // Pout = 17 - (15 - OutputPower)
                self.write_register(Register::RegPaDac, PaDac::_20DbmOff.value()).await?;
                self.write_register(Register::RegOcp, OcpTrim::_100Ma.value()).await?;
                self.write_register(Register::RegPaConfig, PaConfig::PaBoost.value() | (txp - 2) as u8)
                    .await?;
            }
        } else {
            // Pmax = 10.8 + 0.6 * MaxPower and Pout = Pmax - (15 - OutputPower)
            let pa_config = if output_power < 0 {
                // MaxPower 0: Pmax 10.8, [-4, -1] dBm
                PaConfig::MaxPower0NoPaBoost.value() | (output_power + 4) as u8
            } else {
                // MaxPower 7: Pmax 15, [0, 14] dBm
                PaConfig::MaxPower7NoPaBoost.value() | output_power as u8
            };
            self.write_register(Register::RegPaDac, PaDac::_20DbmOff.value()).await?;
            self.write_register(Register::RegOcp, OcpTrim::_100Ma.value()).await?;
            self.write_register(Register::RegPaConfig, pa_config).await?;
        }
        self.write_register(Register::RegPaRamp, RampTime::Ramp40Us.value()).await
    }

    async fn set_packet_params(
        &mut self,
        modulation: &ModulationConfig,
        packet: &PacketConfig,
        payload_len: u8,
    ) -> Result<(), RadioError> {
        let ModulationConfig::LoRa(params) = modulation else {
            return Err(RadioError::UnsupportedModem(modulation.modem()));
        };
        let [pre_msb, pre_lsb] = packet.preamble_length.to_be_bytes();
        self.write_register(Register::RegPreambleMsb, pre_msb).await?;
        self.write_register(Register::RegPreambleLsb, pre_lsb).await?;

        let config_1 = (bandwidth_value(params.bandwidth) << 4)
            | (coding_rate_value(params.coding_rate) << 1)
            | packet.implicit_header as u8;
        self.write_register(Register::RegModemConfig1, config_1).await?;
        let config_2 = (spreading_factor_value(params.spreading_factor)? << 4) | ((packet.crc.is_on() as u8) << 2);
        self.write_register(Register::RegModemConfig2, config_2).await?;

        // Transmit length, and expected length for implicit header reception
        self.write_register(Register::RegPayloadLength, payload_len).await?;

        // IQ inversion:
        // RegInvertiq - [0x33]
        // [6] - InvertIQRX
        // [5:1] - Reserved: 0x13
        // [0] - InvertIQTX
        // RegInvertiq2 - [0x3b]
        // Set to 0x19 when RX, otherwise set 0x1d
        let (iq1, iq2) = match packet.iq_inverted {
            true => (1 << 6, 0x19),
            false => (1 << 0, 0x1d),
        };
        // Keep reserved value for InvertIq as well
        self.write_register(Register::RegInvertiq, (0x13 << 1) | iq1).await?;
        self.write_register(Register::RegInvertiq2, iq2).await
    }

    async fn write_payload(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.write_register(Register::RegFifoAddrPtr, 0x00u8).await?;
        self.intf.write(Register::RegFifo.addr(), payload).await
    }

    async fn arm(
        &mut self,
        request: &ModeRequest,
        irq_mask: u32,
        modulation: &ModulationConfig,
    ) -> Result<(), RadioError> {
        // A set bit masks the interrupt
        self.write_register(Register::RegIrqFlagsMask, !(irq_mask as u8)).await?;

        match request {
            ModeRequest::Transmit => self.set_dio0(DioMapping1Dio0::TxDone).await,
            ModeRequest::Receive { timeout_us } => {
                let ModulationConfig::LoRa(params) = modulation else {
                    return Err(RadioError::UnsupportedModem(modulation.modem()));
                };
                // Single reception when the timeout fits the preamble detection window,
                // otherwise continuous reception ended by the software budget
                let symbols = timeout_us.map(|us| us.div_ceil(params.symbol_duration_us().max(1)));
                match symbols {
                    Some(symbols) if symbols <= SX127X_MAX_LORA_SYMB_NUM_TIMEOUT => {
                        self.set_lora_symbol_num_timeout(symbols).await?;
                        self.rx_mode = LoRaMode::RxSingle;
                    }
                    _ => self.rx_mode = LoRaMode::RxContinuous,
                }
                self.set_lna().await?;
                self.write_register(Register::RegFifoAddrPtr, 0x00u8).await?;
                self.set_dio0(DioMapping1Dio0::RxDone).await
            }
            ModeRequest::ChannelScan => {
                self.set_lna().await?;
                self.set_dio0(DioMapping1Dio0::CadDone).await
            }
            ModeRequest::ReceiveDutyCycle(_) => Err(RadioError::Unsupported),
        }
    }

    async fn launch(&mut self, request: &ModeRequest) -> Result<(), RadioError> {
        let mode = match request {
            ModeRequest::Transmit => LoRaMode::Tx,
            ModeRequest::Receive { .. } => self.rx_mode,
            ModeRequest::ChannelScan => LoRaMode::Cad,
            ModeRequest::ReceiveDutyCycle(_) => return Err(RadioError::Unsupported),
        };
        self.set_mode(mode).await
    }

    async fn irq_flags(&mut self) -> Result<u32, RadioError> {
        Ok(self.read_register(Register::RegIrqFlags).await? as u32)
    }

    // Flags are cleared by writing ones
    async fn clear_irq_flags(&mut self, mask: u32) -> Result<(), RadioError> {
        self.write_register(Register::RegIrqFlags, mask as u8).await
    }

    async fn read_payload(&mut self, packet: &PacketConfig, buffer: &mut [u8]) -> Result<usize, RadioError> {
        let length_register = if packet.implicit_header {
            Register::RegPayloadLength
        } else {
            Register::RegRxNbBytes
        };
        let payload_length = self.read_register(length_register).await? as usize;
        if payload_length > buffer.len() {
            return Err(RadioError::PayloadSizeUnexpected(payload_length));
        }
        let fifo_addr = self.read_register(Register::RegFifoRxCurrentAddr).await?;
        self.write_register(Register::RegFifoAddrPtr, fifo_addr).await?;
        self.intf
            .read(Register::RegFifo.addr(), &mut buffer[..payload_length])
            .await?;
        self.write_register(Register::RegFifoAddrPtr, 0x00u8).await?;

        Ok(payload_length)
    }

    async fn packet_status(&mut self, modulation: &ModulationConfig) -> Result<PacketStatus, RadioError> {
        if modulation.modem() != Modem::LoRa {
            return Err(RadioError::UnsupportedModem(modulation.modem()));
        }
        let snr = {
            let packet_snr = self.read_register(Register::RegPktSnrValue).await?;
            packet_snr as i8 as i16 / 4
        };

        let rssi = {
            let packet_rssi = self.read_register(Register::RegPktRssiValue).await?;
            if snr >= 0 {
                self.rssi_offset() + linearize_rssi(packet_rssi)
            } else {
                self.rssi_offset() + (packet_rssi as i16) + snr
            }
        };

        Ok(PacketStatus { rssi, snr: Some(snr) })
    }

    fn check_output_power(&self, output_power: i8) -> Result<(), RadioError> {
        // PA_BOOST: [2, 20] dBm, RFO: [-4, 14] dBm
        let range = if self.config.tx_boost { 2..=20 } else { -4..=14 };
        if range.contains(&output_power) {
            Ok(())
        } else {
            Err(RadioError::InvalidOutputPower(output_power))
        }
    }

    async fn set_current_limit(&mut self, milliamps: u16) -> Result<(), RadioError> {
        // Imax = 45 + 5 * OcpTrim up to 120 mA, then -30 + 10 * OcpTrim
        let trim = if milliamps <= 120 {
            milliamps.saturating_sub(45) / 5
        } else {
            milliamps.saturating_add(30) / 10
        };
        // OCP on
        self.write_register(Register::RegOcp, 0x20 | (trim as u8 & 0x1F)).await
    }

    async fn frequency_error(&mut self, modulation: &ModulationConfig) -> Result<i32, RadioError> {
        let ModulationConfig::LoRa(params) = modulation else {
            return Err(RadioError::WrongModem);
        };
        let mut raw = [0x00u8; 3];
        self.intf.read(Register::RegFeiMsb.addr(), &mut raw).await?;
        let raw = u32::from_be_bytes([0, raw[0], raw[1], raw[2]]) & 0x0F_FFFF;
        // 20 bit two's complement
        let fei = if raw & 0x08_0000 != 0 {
            raw as i64 - 0x10_0000
        } else {
            raw as i64
        };
        // Ferr = FreqError * 2^24 / Fxtal * BW / 500 kHz
        Ok((fei * (1 << 24) * params.bandwidth.hz() as i64 / (SX127X_XTAL_FREQ as i64 * 500_000)) as i32)
    }

    fn validate(&self, modulation: &ModulationConfig, packet: &PacketConfig) -> Result<(), RadioError> {
        let ModulationConfig::LoRa(params) = modulation else {
            return Err(RadioError::UnsupportedModem(modulation.modem()));
        };
        spreading_factor_value(params.spreading_factor)?;
        if params.spreading_factor == SpreadingFactor::_6 && !packet.implicit_header {
            return Err(RadioError::InvalidSF6ExplicitHeaderRequest);
        }
        if packet.sync_word.len_bits != 8 {
            return Err(RadioError::InvalidSyncWord);
        }
        Ok(())
    }
}
