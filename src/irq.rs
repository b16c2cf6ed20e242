use core::ops::BitOr;

use crate::mod_params::*;

/// A set of logical interrupt events
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IrqEventSet(u16);

impl IrqEventSet {
    /// No events
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Set holding exactly `events`
    pub fn of(events: &[IrqEvent]) -> Self {
        events.iter().fold(Self::empty(), |set, event| set.with(*event))
    }

    /// This set plus `event`
    pub const fn with(self, event: IrqEvent) -> Self {
        Self(self.0 | (1 << event.index()))
    }

    /// Whether `event` is in the set
    pub const fn contains(&self, event: IrqEvent) -> bool {
        self.0 & (1 << event.index()) != 0
    }

    /// Whether the set holds no event
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Events in the set
    pub fn iter(&self) -> impl Iterator<Item = IrqEvent> + '_ {
        IrqEvent::ALL.into_iter().filter(move |event| self.contains(*event))
    }
}

impl From<IrqEvent> for IrqEventSet {
    fn from(event: IrqEvent) -> Self {
        Self::empty().with(event)
    }
}

impl BitOr for IrqEventSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<IrqEvent> for IrqEventSet {
    type Output = Self;

    fn bitor(self, rhs: IrqEvent) -> Self {
        self.with(rhs)
    }
}

/// Chip bit position of every logical event; `None` marks an event the chip cannot raise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqMap([Option<u8>; 10]);

impl IrqMap {
    /// Build a map from bit positions listed in [`IrqEvent::ALL`] order
    pub const fn new(bits: [Option<u8>; 10]) -> Self {
        Self(bits)
    }
}

/// Bit assigned to a logical event
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqLine {
    /// Mask of the chip bit raising the event
    Mapped(u32),
    /// The chip has no such event
    NotSupported,
}

/// Translates between logical events and the interrupt bits of one chip
#[derive(Debug, Clone, Copy)]
pub struct IrqTranslator {
    map: IrqMap,
}

impl IrqTranslator {
    /// Translator for a fixed map
    pub const fn new(map: IrqMap) -> Self {
        Self { map }
    }

    /// Chip bit of `event`, or the not supported marker
    pub fn resolve(&self, event: IrqEvent) -> IrqLine {
        match self.map.0[event.index()] {
            Some(bit) => IrqLine::Mapped(1 << bit),
            None => IrqLine::NotSupported,
        }
    }

    /// Whether the chip can raise `event`
    pub fn supports(&self, event: IrqEvent) -> bool {
        self.resolve(event) != IrqLine::NotSupported
    }

    /// Chip bit of an event the caller cannot do without
    pub fn require(&self, event: IrqEvent) -> Result<u32, RadioError> {
        match self.resolve(event) {
            IrqLine::Mapped(mask) => Ok(mask),
            IrqLine::NotSupported => Err(RadioError::UnsupportedEvent(event)),
        }
    }

    /// Chip mask of the supported events in `events`; unsupported ones contribute nothing
    pub fn to_chip(&self, events: IrqEventSet) -> u32 {
        events.iter().fold(0, |mask, event| match self.resolve(event) {
            IrqLine::Mapped(bit) => mask | bit,
            IrqLine::NotSupported => mask,
        })
    }

    /// Logical events raised in a chip interrupt word; unmapped chip bits are ignored
    pub fn from_chip(&self, flags: u32) -> IrqEventSet {
        IrqEvent::ALL
            .into_iter()
            .filter(|event| matches!(self.resolve(*event), IrqLine::Mapped(bit) if flags & bit != 0))
            .fold(IrqEventSet::empty(), IrqEventSet::with)
    }

    /// Mask of every event the chip supports
    pub fn all(&self) -> u32 {
        self.to_chip(IrqEventSet::of(&IrqEvent::ALL))
    }
}
