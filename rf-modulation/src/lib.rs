#![no_std]
//! Modulation characteristics shared by the transceiver driver and any layer above it that
//! needs to reason about airtime (a MAC, a duty-cycle accountant) without owning a radio.

mod airtime;
pub use airtime::*;

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Channel width.
pub enum Bandwidth {
    _7KHz,
    _10KHz,
    _15KHz,
    _20KHz,
    _31KHz,
    _41KHz,
    _62KHz,
    _125KHz,
    _250KHz,
    _500KHz,
}

impl Bandwidth {
    /// Every LoRa bandwidth, narrowest first.
    pub const ALL: [Bandwidth; 10] = [
        Bandwidth::_7KHz,
        Bandwidth::_10KHz,
        Bandwidth::_15KHz,
        Bandwidth::_20KHz,
        Bandwidth::_31KHz,
        Bandwidth::_41KHz,
        Bandwidth::_62KHz,
        Bandwidth::_125KHz,
        Bandwidth::_250KHz,
        Bandwidth::_500KHz,
    ];

    /// Bandwidth in Hz
    pub const fn hz(self) -> u32 {
        match self {
            Bandwidth::_7KHz => 7810u32,
            Bandwidth::_10KHz => 10420u32,
            Bandwidth::_15KHz => 15630u32,
            Bandwidth::_20KHz => 20830u32,
            Bandwidth::_31KHz => 31250u32,
            Bandwidth::_41KHz => 41670u32,
            Bandwidth::_62KHz => 62500u32,
            Bandwidth::_125KHz => 125000u32,
            Bandwidth::_250KHz => 250000u32,
            Bandwidth::_500KHz => 500000u32,
        }
    }
}

impl From<Bandwidth> for u32 {
    fn from(value: Bandwidth) -> Self {
        value.hz()
    }
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// Controls the chirp rate. Lower values are slower bandwidth, but more robust.
pub enum SpreadingFactor {
    _5,
    _6,
    _7,
    _8,
    _9,
    _10,
    _11,
    _12,
}

impl SpreadingFactor {
    /// Every spreading factor, fastest first.
    pub const ALL: [SpreadingFactor; 8] = [
        SpreadingFactor::_5,
        SpreadingFactor::_6,
        SpreadingFactor::_7,
        SpreadingFactor::_8,
        SpreadingFactor::_9,
        SpreadingFactor::_10,
        SpreadingFactor::_11,
        SpreadingFactor::_12,
    ];

    /// Spreading factor as its numerical value
    pub const fn value(self) -> u8 {
        match self {
            SpreadingFactor::_5 => 5,
            SpreadingFactor::_6 => 6,
            SpreadingFactor::_7 => 7,
            SpreadingFactor::_8 => 8,
            SpreadingFactor::_9 => 9,
            SpreadingFactor::_10 => 10,
            SpreadingFactor::_11 => 11,
            SpreadingFactor::_12 => 12,
        }
    }
}

impl From<SpreadingFactor> for u32 {
    fn from(sf: SpreadingFactor) -> Self {
        sf.value() as u32
    }
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Controls the forward error correction. Higher values are more robust, but reduces the ratio
/// of actual data in transmissions.
pub enum CodingRate {
    _4_5,
    _4_6,
    _4_7,
    _4_8,
}

impl CodingRate {
    /// Every coding rate, least redundant first.
    pub const ALL: [CodingRate; 4] = [CodingRate::_4_5, CodingRate::_4_6, CodingRate::_4_7, CodingRate::_4_8];

    /// Denominator of the 4/x ratio, i.e. coded bits per 4 data bits.
    pub const fn denominator(self) -> u8 {
        match self {
            CodingRate::_4_5 => 5,
            CodingRate::_4_6 => 6,
            CodingRate::_4_7 => 7,
            CodingRate::_4_8 => 8,
        }
    }
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Low data rate optimization selection.
pub enum Ldro {
    /// Enabled when the symbol period exceeds 16 ms
    Auto,
    On,
    Off,
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Parameters of a LoRa (chirp spread spectrum) modem.
pub struct LoRaParams {
    pub spreading_factor: SpreadingFactor,
    pub bandwidth: Bandwidth,
    pub coding_rate: CodingRate,
    pub ldro: Ldro,
}

impl LoRaParams {
    /// Duration of one symbol, 2^SF / BW, in microseconds.
    pub fn symbol_duration_us(&self) -> u32 {
        ((1_000_000u64 << self.spreading_factor.value()) / self.bandwidth.hz() as u64) as u32
    }

    /// Whether low data rate optimization applies to these parameters.
    pub fn ldro_enabled(&self) -> bool {
        match self.ldro {
            Ldro::On => true,
            Ldro::Off => false,
            Ldro::Auto => self.symbol_duration_us() > 16_000,
        }
    }
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Gaussian filter applied to (G)FSK symbols.
pub enum PulseShape {
    None,
    Gaussian0_3,
    Gaussian0_5,
    Gaussian0_7,
    Gaussian1_0,
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Parameters of a (G)FSK modem.
pub struct FskParams {
    /// Bit rate in bits per second
    pub bit_rate_bps: u32,
    /// Frequency deviation in Hz
    pub frequency_deviation_hz: u32,
    /// Receiver filter bandwidth in Hz; chips round up to their nearest supported filter
    pub rx_bandwidth_hz: u32,
    pub pulse_shape: PulseShape,
}

impl FskParams {
    /// Build parameters from a bit rate and deviation given in kbps and kHz.
    pub fn from_kbps(bit_rate_kbps: f32, deviation_khz: f32, rx_bandwidth_khz: f32, pulse_shape: PulseShape) -> Self {
        use num_traits::float::FloatCore;
        Self {
            bit_rate_bps: (bit_rate_kbps * 1000.0).round() as u32,
            frequency_deviation_hz: (deviation_khz * 1000.0).round() as u32,
            rx_bandwidth_hz: (rx_bandwidth_khz * 1000.0).round() as u32,
            pulse_shape,
        }
    }
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Forward error correction ratio of LR-FHSS.
pub enum LrFhssCodingRate {
    _5_6,
    _2_3,
    _1_2,
    _1_3,
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Spacing of the LR-FHSS hopping grid.
pub enum LrFhssGrid {
    _25_39KHz,
    _3_91KHz,
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Occupied bandwidth of an LR-FHSS transmission.
pub enum LrFhssBandwidth {
    _39KHz,
    _85KHz,
    _136KHz,
    _183KHz,
    _335KHz,
    _386KHz,
    _722KHz,
    _773KHz,
    _1523KHz,
    _1574KHz,
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Parameters of a long range frequency hopping spread spectrum transmitter.
pub struct LrFhssParams {
    pub coding_rate: LrFhssCodingRate,
    pub grid: LrFhssGrid,
    pub bandwidth: LrFhssBandwidth,
    /// Number of header repetitions, 1 to 4
    pub header_count: u8,
    pub hopping: bool,
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Modem family a configuration belongs to.
pub enum Modem {
    LoRa,
    Fsk,
    LrFhss,
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Modem parameters, tagged by the modem they apply to.
pub enum ModulationConfig {
    LoRa(LoRaParams),
    Fsk(FskParams),
    LrFhss(LrFhssParams),
}

impl ModulationConfig {
    /// The modem this configuration selects.
    pub fn modem(&self) -> Modem {
        match self {
            ModulationConfig::LoRa(_) => Modem::LoRa,
            ModulationConfig::Fsk(_) => Modem::Fsk,
            ModulationConfig::LrFhss(_) => Modem::LrFhss,
        }
    }
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Payload integrity check appended to each frame.
pub enum Crc {
    Off,
    /// One byte CRC; LoRa modems treat any enabled CRC as 16 bits
    Bytes1,
    Bytes2,
}

impl Crc {
    /// CRC length in bytes as carried by an FSK frame
    pub const fn len(self) -> u32 {
        match self {
            Crc::Off => 0,
            Crc::Bytes1 => 1,
            Crc::Bytes2 => 2,
        }
    }

    /// Whether a CRC is appended
    pub const fn is_on(self) -> bool {
        !matches!(self, Crc::Off)
    }
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Synchronization word. The length is always expressed in bits.
pub struct SyncWord {
    pub value: [u8; 8],
    pub len_bits: u8,
}

impl SyncWord {
    /// LoRa sync word used by public networks
    pub const LORA_PUBLIC: SyncWord = SyncWord::lora(0x34);
    /// LoRa sync word used by private networks
    pub const LORA_PRIVATE: SyncWord = SyncWord::lora(0x12);

    /// Single byte LoRa sync word
    pub const fn lora(value: u8) -> Self {
        Self {
            value: [value, 0, 0, 0, 0, 0, 0, 0],
            len_bits: 8,
        }
    }

    /// Sync word from up to eight bytes, transmitted most significant byte first; `None` when
    /// `bytes` is longer
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut value = [0u8; 8];
        value.get_mut(..bytes.len())?.copy_from_slice(bytes);
        Some(Self {
            value,
            len_bits: (bytes.len() * 8) as u8,
        })
    }

    /// Number of bytes needed to hold the sync word
    pub fn len_bytes(&self) -> usize {
        (self.len_bits as usize + 7) / 8
    }

    /// Sync word bytes, most significant first
    pub fn bytes(&self) -> &[u8] {
        &self.value[..self.len_bytes()]
    }
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Framing of a packet, shared between transmit and receive.
pub struct PacketConfig {
    /// Preamble length: symbols for LoRa, bits for FSK
    pub preamble_length: u16,
    /// No header on air; for FSK this selects fixed length packets
    pub implicit_header: bool,
    pub crc: Crc,
    pub iq_inverted: bool,
    pub sync_word: SyncWord,
    /// FSK data whitening
    pub whitening: bool,
}

impl PacketConfig {
    /// Framing commonly used with LoRa: 8 symbol preamble, explicit header, CRC on
    pub const fn lora_default(sync_word: SyncWord) -> Self {
        Self {
            preamble_length: 8,
            implicit_header: false,
            crc: Crc::Bytes2,
            iq_inverted: false,
            sync_word,
            whitening: false,
        }
    }

    /// Framing commonly used with GFSK: 16 bit preamble, 16 bit sync word, 2 byte CRC
    pub const fn fsk_default(sync_word: SyncWord) -> Self {
        Self {
            preamble_length: 16,
            implicit_header: false,
            crc: Crc::Bytes2,
            iq_inverted: false,
            sync_word,
            whitening: true,
        }
    }
}
