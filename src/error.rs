use core::fmt;
use embedded_time::{clock, ConversionError};

/// Result type for boot-time and clock-driven operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A driver error.
///
/// Only boot and clock reads can fail. Capture, generation, reads and writes
/// clamp or ignore bad values instead of returning errors.
#[derive(Debug)]
pub enum Error {
    /// The clock used for a staleness query failed.
    Clock(clock::Error),

    /// The clock's instant could not be expressed in microseconds.
    Time(ConversionError),

    /// A layout referenced a port outside the board's descriptor table.
    InvalidPort { port: usize },
}

impl From<clock::Error> for Error {
    fn from(clock_error: clock::Error) -> Self {
        Error::Clock(clock_error)
    }
}

impl From<ConversionError> for Error {
    fn from(time_error: ConversionError) -> Self {
        Error::Time(time_error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Clock(e) => write!(f, "clock error: {:?}", e),
            Error::Time(e) => write!(f, "time conversion error: {:?}", e),
            Error::InvalidPort { port } => write!(f, "port {} is not on this board", port),
        }
    }
}
