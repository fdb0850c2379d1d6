use core::fmt;

use crate::power::PowerError;

/// Errors returned by the sensor drivers.
///
/// `E` is the error type of the underlying SCCB (I2C) bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Bus transaction failed
    Bus(E),
    /// A reset or power-down GPIO could not be driven
    Pin,
    /// The XCLK generator could not be started or stopped
    Xclk,
    /// The parameter can not be read back from this sensor
    NotSupported,
    /// The parameter or argument is not accepted by this sensor
    InvalidArgument,
    /// The mode register program failed part way through
    SetFormat(E),
    /// The chip answered with an unexpected product id
    UnexpectedId { expected: u32, found: u32 },
}

impl<E> Error<E> {
    /// The bus error behind this failure, if there is one.
    pub fn bus_error(&self) -> Option<&E> {
        match self {
            Error::Bus(e) | Error::SetFormat(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<PowerError> for Error<E> {
    fn from(e: PowerError) -> Self {
        match e {
            PowerError::Pin => Error::Pin,
            PowerError::Xclk => Error::Xclk,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "sccb transaction failed: {:?}", e),
            Error::Pin => f.write_str("failed to drive sensor gpio"),
            Error::Xclk => f.write_str("failed to drive xclk"),
            Error::NotSupported => f.write_str("parameter not supported"),
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::SetFormat(e) => write!(f, "failed to set format registers: {:?}", e),
            Error::UnexpectedId { expected, found } => {
                write!(f, "unexpected sensor id {:#x}, expected {:#x}", found, expected)
            }
        }
    }
}

/// Errors returned by an XCLK generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum XclkError<TE, PE> {
    /// The timer rejected the requested frequency
    Timer(TE),
    /// The PWM channel could not be driven
    Channel(PE),
    /// Zero or otherwise unusable frequency
    InvalidFrequency,
}

impl<TE: fmt::Debug, PE: fmt::Debug> fmt::Display for XclkError<TE, PE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XclkError::Timer(e) => write!(f, "xclk timer config failed: {:?}", e),
            XclkError::Channel(e) => write!(f, "xclk channel config failed: {:?}", e),
            XclkError::InvalidFrequency => f.write_str("invalid xclk frequency"),
        }
    }
}
