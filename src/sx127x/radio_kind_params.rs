use crate::mod_params::*;

/// Internal sx127x LoRa modes (signified by most significant bit flag)
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LoRaMode {
    Sleep = 0x00,
    Standby = 0x01,
    FsTx = 0x02,
    Tx = 0x03,
    RxContinuous = 0x05,
    RxSingle = 0x06,
    Cad = 0x07,
}

impl LoRaMode {
    /// Mode value, including LoRa flag
    pub fn value(self) -> u8 {
        (self as u8) | 0x80u8
    }
}

// IRQ mapping for sx127x chips:
// DIO0 - RxDone, TxDone, CadDone
// DIO1 - RxTimeout, FhssChangeChannel, CadDetected
// DIO3 - CadDone, ValidHeader, PayloadCrcError
// Only DIO0 is wired to the completion line; the other flags are read from RegIrqFlags.
pub enum DioMapping1Dio0 {
    RxDone = 0x00,
    TxDone = 0x40,
    CadDone = 0x80,
    Mask = 0x3f,
}

impl DioMapping1Dio0 {
    pub fn value(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy)]
pub enum Register {
    RegFifo = 0x00,
    RegOpMode = 0x01,
    RegFrfMsb = 0x06,
    RegPaConfig = 0x09,
    RegPaRamp = 0x0a,
    RegOcp = 0x0b,
    RegLna = 0x0c,
    RegFifoAddrPtr = 0x0d,
    RegFifoTxBaseAddr = 0x0e,
    RegFifoRxBaseAddr = 0x0f,
    RegFifoRxCurrentAddr = 0x10,
    RegIrqFlagsMask = 0x11,
    RegIrqFlags = 0x12,
    RegRxNbBytes = 0x13,
    RegPktSnrValue = 0x19,
    RegPktRssiValue = 0x1a,
    RegModemConfig1 = 0x1d,
    RegModemConfig2 = 0x1e,
    RegSymbTimeoutLsb = 0x1f,
    RegPreambleMsb = 0x20,
    RegPreambleLsb = 0x21,
    RegPayloadLength = 0x22,
    RegMaxPayloadLength = 0x23,
    RegModemConfig3 = 0x26,
    RegFeiMsb = 0x28,
    RegDetectionOptimize = 0x31,
    RegInvertiq = 0x33,
    RegDetectionThreshold = 0x37,
    RegSyncWord = 0x39,
    RegInvertiq2 = 0x3b,
    RegDioMapping1 = 0x40,
    RegVersion = 0x42,
    RegTcxo = 0x4b,
    RegPaDac = 0x4d,
}

impl Register {
    pub fn addr(self) -> u32 {
        self as u32
    }
}

#[derive(Clone, Copy)]
pub enum RampTime {
    Ramp40Us = 0x09,
}

impl RampTime {
    pub fn value(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy)]
pub enum LnaGain {
    G1 = 0x20, // maximum gain (default)
}

impl LnaGain {
    pub fn value(self) -> u8 {
        self as u8
    }
    pub fn boosted_value(self) -> u8 {
        (self as u8) | 0x03u8
    }
}

/// PA DAC configuration
#[derive(Clone, Copy)]
pub enum PaDac {
    _20DbmOn = 0x87,
    _20DbmOff = 0x84,
}

impl PaDac {
    pub fn value(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy)]
pub enum PaConfig {
    PaBoost = 0x80,
    MaxPower7NoPaBoost = 0x70,
    MaxPower0NoPaBoost = 0x00,
}

impl PaConfig {
    pub fn value(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum OcpTrim {
    _100Ma = 0x0b,
    _240Ma = 0x1b,
}

impl OcpTrim {
    pub fn value(self) -> u8 {
        (self as u8) | 0x20u8 // value plus OCP on flag
    }
}

pub fn spreading_factor_value(spreading_factor: SpreadingFactor) -> Result<u8, RadioError> {
    match spreading_factor {
        SpreadingFactor::_5 => Err(RadioError::UnavailableSpreadingFactor),
        spreading_factor => Ok(spreading_factor.value()),
    }
}

pub fn bandwidth_value(bandwidth: Bandwidth) -> u8 {
    match bandwidth {
        Bandwidth::_7KHz => 0x00,
        Bandwidth::_10KHz => 0x01,
        Bandwidth::_15KHz => 0x02,
        Bandwidth::_20KHz => 0x03,
        Bandwidth::_31KHz => 0x04,
        Bandwidth::_41KHz => 0x05,
        Bandwidth::_62KHz => 0x06,
        Bandwidth::_125KHz => 0x07,
        Bandwidth::_250KHz => 0x08,
        Bandwidth::_500KHz => 0x09,
    }
}

// Register value is the denominator minus 4
pub fn coding_rate_value(coding_rate: CodingRate) -> u8 {
    coding_rate.denominator() - 4
}
