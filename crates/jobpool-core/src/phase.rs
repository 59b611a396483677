//! Job phase

use core::fmt;

/// Phase of a job circulating through the pool
///
/// The phase is inspected by a lane after it claims a job and decides which
/// handler capability runs next. Handlers move the job between phases;
/// `Closed` is terminal and takes the job out of circulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Phase {
    /// Not waiting on anything; passes through a lane without a handler call
    #[default]
    Idle = 0,

    /// Waiting for the read handler
    NeedsRead = 1,

    /// Waiting for the write handler
    NeedsWrite = 2,

    /// Finished; never dispatched again
    Closed = 3,
}

impl Phase {
    /// `Closed` is the only phase with no way back
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Phase::Closed)
    }
}

impl From<u8> for Phase {
    fn from(v: u8) -> Self {
        match v {
            1 => Phase::NeedsRead,
            2 => Phase::NeedsWrite,
            3 => Phase::Closed,
            _ => Phase::Idle,
        }
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> u8 {
        phase as u8
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "IDLE"),
            Phase::NeedsRead => write!(f, "NEEDS_READ"),
            Phase::NeedsWrite => write!(f, "NEEDS_WRITE"),
            Phase::Closed => write!(f, "CLOSED"),
        }
    }
}
