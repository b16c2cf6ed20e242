use crate::interface::TransactionStatus;
use crate::mod_params::*;

#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(clippy::upper_case_acronyms)]
pub enum PacketType {
    GFSK = 0x00,
    LoRa = 0x01,
}

impl PacketType {
    pub const fn value(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy)]
#[allow(clippy::upper_case_acronyms)]
pub enum Register {
    PayloadLength = 0x0702, // payload size
    Syncword = 0x06C0,      // GFSK syncword, up to eight bytes
    LoRaSyncword = 0x0740,  // LoRa Syncword value
    RxGain = 0x08AC,        // RX gain (0x94: power saving, 0x96: rx boosted)
    /// Inverted IQ operation optimization - possible packet loss for longer packets
    /// DS.SX1261-2.W.APP Rev.2.1 - Chapter 15.4
    IQPolarity = 0x0736,
    TxModulation = 0x0889, // modulation quality with 500 kHz LoRa Bandwidth (see DS_SX1261-2_V1.2 datasheet chapter 15.1)
    TxClampCfg = 0x08D8,   // better resistance to antenna mismatch (see DS_SX1261-2_V1.2 datasheet chapter 15.2)
    RTCCtrl = 0x0902,      // RTC control
    EvtClr = 0x0944,       // event clear
    Version = 0x0320,      // null terminated version string
    FreqError = 0x076B,    // 20 bit LoRa frequency error estimate
    RandomNumber = 0x0819, // four bytes of wideband noise while receiving
    AnaLNA = 0x08E2,       // bit 0 enables the LNA
    AnaMixer = 0x08E5,     // bit 7 enables the mixer
    Ocp = 0x08E7,          // over current protection, 2.5 mA steps
}

impl Register {
    pub fn addr(self) -> u32 {
        self as u32
    }
}

#[derive(Clone, Copy, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
pub enum OpCode {
    WriteRegister = 0x0D,
    ReadRegister = 0x1D,
    WriteBuffer = 0x0E,
    ReadBuffer = 0x1E,
    SetSleep = 0x84,
    SetStandby = 0x80,
    SetFS = 0xC1,
    SetTx = 0x83,
    SetRx = 0x82,
    SetRxDutyCycle = 0x94,
    SetCAD = 0xC5,
    SetTxContinuousWave = 0xD1,
    SetPacketType = 0x8A,
    SetRFFrequency = 0x86,
    SetTxParams = 0x8E,
    SetPAConfig = 0x95,
    SetCADParams = 0x88,
    SetBufferBaseAddress = 0x8F,
    SetModulationParams = 0x8B,
    SetPacketParams = 0x8C,
    GetRxBufferStatus = 0x13,
    GetPacketStatus = 0x14,
    CfgDIOIrq = 0x08,
    GetIrqStatus = 0x12,
    ClrIrqStatus = 0x02,
    Calibrate = 0x89,
    CalibrateImage = 0x98,
    SetRegulatorMode = 0x96,
    ClearDeviceErrors = 0x07,
    SetTCXOMode = 0x97,
    SetDIO2AsRfSwitchCtrl = 0x9D,
    SetStopRxTimerOnPreamble = 0x9F,
    SetLoRaSymbTimeout = 0xA0,
}

impl OpCode {
    pub fn value(self) -> u16 {
        self as u16
    }
}

// Command status, bits 3:1 of the status byte. See RM0453 section 5.8.5
const STATUS_COMMAND_MASK: u8 = 0x0E;
const STATUS_TIMEOUT: u8 = 0x03 << 1;
const STATUS_PROCESSING_ERROR: u8 = 0x04 << 1;
const STATUS_EXECUTION_ERROR: u8 = 0x05 << 1;

/// Decode the status byte clocked out by the chip during a command
pub fn parse_status(status: u8) -> TransactionStatus {
    if status == 0x00 || status == 0xFF {
        return TransactionStatus::DeviceNotFound;
    }
    match status & STATUS_COMMAND_MASK {
        STATUS_TIMEOUT => TransactionStatus::Timeout,
        STATUS_PROCESSING_ERROR => TransactionStatus::InvalidCommand,
        STATUS_EXECUTION_ERROR => TransactionStatus::CommandFailed,
        _ => TransactionStatus::Success,
    }
}

#[derive(Clone, Copy)]
pub struct SleepParams {
    pub wakeup_rtc: bool, // get out of sleep mode if wakeup signal received from RTC
    pub reset: bool,
    pub warm_start: bool,
}

impl SleepParams {
    pub fn value(self) -> u8 {
        ((self.warm_start as u8) << 2) | ((self.reset as u8) << 1) | (self.wakeup_rtc as u8)
    }
}

pub fn standby_value(clock: StandbyClock) -> u8 {
    match clock {
        StandbyClock::Rc => 0x00,
        StandbyClock::Xosc => 0x01,
    }
}

#[derive(Clone, Copy)]
pub enum RegulatorMode {
    UseDCDC = 0x01,
}

impl RegulatorMode {
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// TCXO supply voltage driven on DIO3
#[allow(missing_docs)]
#[derive(Clone, Copy)]
pub enum TcxoCtrlVoltage {
    Ctrl1V6 = 0x00,
    Ctrl1V7 = 0x01,
    Ctrl1V8 = 0x02,
    Ctrl2V2 = 0x03,
    Ctrl2V4 = 0x04,
    Ctrl2V7 = 0x05,
    Ctrl3V0 = 0x06,
    Ctrl3V3 = 0x07,
}

impl TcxoCtrlVoltage {
    /// Register encoding
    pub fn value(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum RampTime {
    Ramp40Us = 0x02,
}

impl RampTime {
    pub fn value(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy)]
pub enum CADSymbols {
    _8 = 0x03,
}

impl CADSymbols {
    pub fn value(self) -> u8 {
        self as u8
    }
}

pub fn spreading_factor_value(spreading_factor: SpreadingFactor) -> u8 {
    spreading_factor.value()
}

pub fn bandwidth_value(bandwidth: Bandwidth) -> u8 {
    match bandwidth {
        Bandwidth::_7KHz => 0x00,
        Bandwidth::_10KHz => 0x08,
        Bandwidth::_15KHz => 0x01,
        Bandwidth::_20KHz => 0x09,
        Bandwidth::_31KHz => 0x02,
        Bandwidth::_41KHz => 0x0a,
        Bandwidth::_62KHz => 0x03,
        Bandwidth::_125KHz => 0x04,
        Bandwidth::_250KHz => 0x05,
        Bandwidth::_500KHz => 0x06,
    }
}

pub fn coding_rate_value(coding_rate: CodingRate) -> u8 {
    match coding_rate {
        CodingRate::_4_5 => 0x01,
        CodingRate::_4_6 => 0x02,
        CodingRate::_4_7 => 0x03,
        CodingRate::_4_8 => 0x04,
    }
}

pub fn pulse_shape_value(pulse_shape: PulseShape) -> u8 {
    match pulse_shape {
        PulseShape::None => 0x00,
        PulseShape::Gaussian0_3 => 0x08,
        PulseShape::Gaussian0_5 => 0x09,
        PulseShape::Gaussian0_7 => 0x0A,
        PulseShape::Gaussian1_0 => 0x0B,
    }
}

// GFSK receiver filters, narrowest first: (double sided bandwidth in Hz, code)
const GFSK_RX_BANDWIDTHS: [(u32, u8); 21] = [
    (4_800, 0x1F),
    (5_800, 0x17),
    (7_300, 0x0F),
    (9_700, 0x1E),
    (11_700, 0x16),
    (14_600, 0x0E),
    (19_500, 0x1D),
    (23_400, 0x15),
    (29_300, 0x0D),
    (39_000, 0x1C),
    (46_900, 0x14),
    (58_600, 0x0C),
    (78_200, 0x1B),
    (93_800, 0x13),
    (117_300, 0x0B),
    (156_200, 0x1A),
    (187_200, 0x12),
    (234_300, 0x0A),
    (312_000, 0x19),
    (373_600, 0x11),
    (467_000, 0x09),
];

/// Code of the narrowest filter at least `hz` wide
pub fn gfsk_rx_bandwidth_value(hz: u32) -> Result<u8, RadioError> {
    GFSK_RX_BANDWIDTHS
        .iter()
        .find(|(bandwidth, _)| *bandwidth >= hz)
        .map(|(_, code)| *code)
        .ok_or(RadioError::UnavailableBandwidth)
}

pub fn gfsk_crc_value(crc: Crc) -> u8 {
    match crc {
        Crc::Off => 0x01,
        Crc::Bytes1 => 0x00,
        Crc::Bytes2 => 0x02,
    }
}

// Preamble detector length: 8 bits
pub const GFSK_PREAMBLE_DETECTOR_8_BITS: u8 = 0x04;
