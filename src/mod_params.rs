pub use rf_modulation::*;

/// Errors types reported during physical layer processing
#[allow(clippy::upper_case_acronyms)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum RadioError {
    // Configuration: rejected before anything is written to the chip
    WrongModem,
    InvalidFrequency(u32),
    InvalidOutputPower(i8),
    InvalidCurrentLimit(u16),
    InvalidPreambleLength(u16),
    InvalidBandwidthForFrequency,
    InvalidSF6ExplicitHeaderRequest,
    UnavailableSpreadingFactor,
    UnavailableBandwidth,
    InvalidSyncWord,
    PayloadSizeUnexpected(usize),
    FrameTooLong(usize),
    // Transaction
    SPI,
    Reset,
    Busy,
    Irq,
    RfSwitch,
    InvalidCommand,
    CommandFailed,
    CommandTimeout,
    NoResponse,
    // Timeout
    TransmitTimeout,
    ReceiveTimeout,
    ChannelScanTimeout,
    // Integrity
    CrcMismatch(usize),
    HeaderError,
    // Not found
    DeviceNotFound,
    // Unsupported
    UnsupportedModem(Modem),
    UnsupportedEvent(IrqEvent),
    NothingStaged,
    Unsupported,
}

/// Broad classes of [`RadioError`], for callers deciding whether to retry, reconfigure or give up
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value out of range or not applicable to the active modem
    Configuration,
    /// The bus or the chip failed to carry out a command
    Transaction,
    /// An operation outlived its timing budget
    Timeout,
    /// A frame arrived damaged; its payload was still delivered
    Integrity,
    /// The chip did not identify itself
    NotFound,
    /// Meaningless for the active modem or chip, or nothing was staged
    Unsupported,
}

impl RadioError {
    /// Class this error belongs to
    pub fn kind(&self) -> ErrorKind {
        use RadioError::*;
        match self {
            WrongModem
            | InvalidFrequency(_)
            | InvalidOutputPower(_)
            | InvalidCurrentLimit(_)
            | InvalidPreambleLength(_)
            | InvalidBandwidthForFrequency
            | InvalidSF6ExplicitHeaderRequest
            | UnavailableSpreadingFactor
            | UnavailableBandwidth
            | InvalidSyncWord
            | PayloadSizeUnexpected(_)
            | FrameTooLong(_) => ErrorKind::Configuration,
            SPI | Reset | Busy | Irq | RfSwitch | InvalidCommand | CommandFailed | CommandTimeout | NoResponse => {
                ErrorKind::Transaction
            }
            TransmitTimeout | ReceiveTimeout | ChannelScanTimeout => ErrorKind::Timeout,
            CrcMismatch(_) | HeaderError => ErrorKind::Integrity,
            DeviceNotFound => ErrorKind::NotFound,
            UnsupportedModem(_) | UnsupportedEvent(_) | NothingStaged | Unsupported => ErrorKind::Unsupported,
        }
    }
}

/// Logical interrupt events, independent of any chip's register layout
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum IrqEvent {
    TxDone,
    RxDone,
    PreambleDetected,
    SyncWordValid,
    HeaderValid,
    HeaderError,
    CrcError,
    CadDone,
    CadDetected,
    Timeout,
}

impl IrqEvent {
    /// Every logical event, in mapping table order
    pub const ALL: [IrqEvent; 10] = [
        IrqEvent::TxDone,
        IrqEvent::RxDone,
        IrqEvent::PreambleDetected,
        IrqEvent::SyncWordValid,
        IrqEvent::HeaderValid,
        IrqEvent::HeaderError,
        IrqEvent::CrcError,
        IrqEvent::CadDone,
        IrqEvent::CadDetected,
        IrqEvent::Timeout,
    ];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Status for a received packet
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct PacketStatus {
    pub rssi: i16,
    /// Signal to noise ratio in dB, LoRa only
    pub snr: Option<i16>,
}

/// Oscillator kept running in standby
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandbyClock {
    /// Internal RC oscillator, lowest current
    Rc,
    /// Crystal oscillator, faster transition to Tx/Rx
    Xosc,
}

/// The state of the radio
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum RadioMode {
    Sleep,
    Standby(StandbyClock),
    FrequencySynthesis,
    Transmit,
    Receive,
    ChannelActivityDetection,
}

/// Electrical position of an external antenna switch
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum RfSwitchState {
    Idle,
    Rx,
    Tx,
}

impl From<RadioMode> for RfSwitchState {
    fn from(mode: RadioMode) -> Self {
        match mode {
            RadioMode::Sleep | RadioMode::Standby(_) | RadioMode::FrequencySynthesis => RfSwitchState::Idle,
            RadioMode::Receive | RadioMode::ChannelActivityDetection => RfSwitchState::Rx,
            RadioMode::Transmit => RfSwitchState::Tx,
        }
    }
}

/// How long a receive may wait for a frame
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxTimeout {
    /// Derived from the airtime of the expected (or largest) frame
    Default,
    /// Explicit limit in microseconds
    After(u32),
    /// Continuous reception, ended only by a frame or by the caller
    Never,
}

/// Outcome of a channel activity detection
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelScanResult {
    /// No LoRa preamble was heard
    Free,
    /// A LoRa preamble was heard
    Detected,
}

/// A receive operation to prepare
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxConfig {
    /// Limit on the wait for a frame
    pub timeout: RxTimeout,
    /// Length of the expected frame; required for implicit header and fixed length framing
    pub expected_len: Option<usize>,
}

/// Listen and sleep periods of a receive duty cycle
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyCycle {
    /// Listening window in microseconds, extended by the chip when a preamble is detected
    pub rx_period_us: u32,
    /// Sleep between windows in microseconds
    pub sleep_period_us: u32,
}

/// An operation for [`crate::Radio::stage`] to prepare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeConfig<'a> {
    /// Load `payload` and arm transmit completion
    Transmit(&'a [u8]),
    /// Arm reception
    Receive(RxConfig),
    /// Arm reception alternating between listening and sleeping until a frame arrives
    ReceiveDutyCycle(DutyCycle),
    /// Arm channel activity detection
    ChannelScan,
}

/// Board level radio configuration applied when a [`crate::Radio`] is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioConfig {
    /// Modem and its parameters
    pub modulation: ModulationConfig,
    /// Framing
    pub packet: PacketConfig,
    /// Carrier frequency
    pub frequency_in_hz: u32,
    /// Transmit power in dBm
    pub output_power: i8,
}
