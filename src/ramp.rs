use std::fmt;
use std::iter::{self, Once, Rev};
use std::ops::RangeInclusive;

/// One step of the controller's three-phase sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reset,
    RampUp,
    RampDown,
}

impl Phase {
    /// Values sent during this phase, in order
    pub fn values(self) -> PhaseValues {
        match self {
            Phase::Reset => PhaseValues::Reset(iter::once(0)),
            Phase::RampUp => PhaseValues::Up(0..=u8::MAX),
            Phase::RampDown => PhaseValues::Down((0..=u8::MAX).rev()),
        }
    }

    /// Whether the step delay follows each message
    pub fn is_ramp(self) -> bool {
        !matches!(self, Phase::Reset)
    }
}

/// Value sequence of a [`Phase`]
#[derive(Debug, Clone)]
pub enum PhaseValues {
    Reset(Once<u8>),
    Up(RangeInclusive<u8>),
    Down(Rev<RangeInclusive<u8>>),
}

impl Iterator for PhaseValues {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        match self {
            PhaseValues::Reset(values) => values.next(),
            PhaseValues::Up(values) => values.next(),
            PhaseValues::Down(values) => values.next(),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Reset => "reset",
            Phase::RampUp => "ramp up",
            Phase::RampDown => "ramp down",
        };
        f.write_str(name)
    }
}
