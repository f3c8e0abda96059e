//! `embedded-storage` NOR flash traits over the block device, for crates
//! that consume flash through those traits. Offsets are logical addresses.

use core::fmt::Debug;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::delay::DelayNs;
use embedded_storage::nor_flash::{ErrorType, MultiwriteNorFlash, NorFlash, ReadNorFlash};

use crate::device::HyperFlashBlockDevice;
use crate::error::{Error, ParameterError};
use crate::geometry::{PROGRAM_SIZE, READ_SIZE, SECTOR_SIZE};
use crate::traits::{BlockDevice, HyperBus};

impl<M, B, D> ErrorType for HyperFlashBlockDevice<M, B, D>
where
    M: RawMutex,
    B: HyperBus,
    B::Error: Debug,
    D: DelayNs,
{
    type Error = Error<B>;
}

impl<M, B, D> ReadNorFlash for HyperFlashBlockDevice<M, B, D>
where
    M: RawMutex,
    B: HyperBus,
    B::Error: Debug,
    D: DelayNs,
{
    const READ_SIZE: usize = READ_SIZE as usize;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        BlockDevice::read(self, offset, bytes)
    }

    fn capacity(&self) -> usize {
        BlockDevice::size(self) as usize
    }
}

impl<M, B, D> NorFlash for HyperFlashBlockDevice<M, B, D>
where
    M: RawMutex,
    B: HyperBus,
    B::Error: Debug,
    D: DelayNs,
{
    const WRITE_SIZE: usize = PROGRAM_SIZE as usize;
    const ERASE_SIZE: usize = SECTOR_SIZE as usize;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        let size = to
            .checked_sub(from)
            .ok_or(Error::InvalidParameter(ParameterError::OutOfBounds))?;
        BlockDevice::erase(self, from, size)
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        BlockDevice::program(self, offset, bytes)
    }
}

/// Programming only clears bits, so a region may be written again without
/// an erase as long as no bit has to go from 0 to 1.
impl<M, B, D> MultiwriteNorFlash for HyperFlashBlockDevice<M, B, D>
where
    M: RawMutex,
    B: HyperBus,
    B::Error: Debug,
    D: DelayNs,
{
}
