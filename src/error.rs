use core::fmt::{self, Debug};
#[cfg(feature = "defmt")]
use defmt::{Format, Formatter};
use embedded_storage::nor_flash::{NorFlashError, NorFlashErrorKind};

use crate::traits::HyperBus;

/// The error type used by this library.
///
/// This can encapsulate a bus error, and adds the block device contract and
/// device timeout errors on top of that.
pub enum Error<B: HyperBus> {
    /// A bus transfer failed.
    Bus(B::Error),
    /// Address or size violates the device geometry. Nothing was sent to the bus.
    InvalidParameter(ParameterError),
    /// The device did not report ready within the configured number of polls.
    DeviceTimeout,
}

/// Why a request was rejected before touching the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParameterError {
    /// Address or size is not a multiple of the operation's granularity.
    Misaligned,
    /// The request runs past the end of the logical address space.
    OutOfBounds,
}

impl<B: HyperBus> From<ParameterError> for Error<B> {
    fn from(value: ParameterError) -> Self {
        Error::InvalidParameter(value)
    }
}

#[cfg(feature = "defmt")]
impl<B: HyperBus> Format for Error<B>
where
    B::Error: Debug,
{
    fn format(&self, fmt: Formatter) {
        match self {
            Error::Bus(_bus) => defmt::write!(fmt, "Error::Bus"),
            Error::InvalidParameter(e) => defmt::write!(fmt, "Error::InvalidParameter({})", e),
            Error::DeviceTimeout => defmt::write!(fmt, "Error::DeviceTimeout"),
        }
    }
}

impl<B: HyperBus> Debug for Error<B>
where
    B::Error: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(bus) => write!(f, "Error::Bus({:?})", bus),
            Error::InvalidParameter(e) => write!(f, "Error::InvalidParameter({:?})", e),
            Error::DeviceTimeout => write!(f, "Error::DeviceTimeout"),
        }
    }
}

impl<B: HyperBus> NorFlashError for Error<B>
where
    B::Error: Debug,
{
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            Error::InvalidParameter(ParameterError::Misaligned) => NorFlashErrorKind::NotAligned,
            Error::InvalidParameter(ParameterError::OutOfBounds) => NorFlashErrorKind::OutOfBounds,
            Error::Bus(_) | Error::DeviceTimeout => NorFlashErrorKind::Other,
        }
    }
}
