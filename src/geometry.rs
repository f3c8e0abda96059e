//! Device geometry and the logical-to-physical address mapping.
//!
//! The first [`Geometry::reserved_offset`] bytes of the physical array are
//! kept for the application image and are not part of the block device:
//!
//! ```text
//! 0x000_0000  +----------------+
//!             |   reserved     |  256K
//! 0x004_0000  +----------------+  logical address 0
//!             |  block device  |
//!             |      ...       |
//! 0x400_0000  +----------------+
//! ```

use crate::error::ParameterError;

/// Read granularity in bytes.
pub const READ_SIZE: u32 = 2;
/// Program granularity in bytes.
pub const PROGRAM_SIZE: u32 = 2;
/// Largest program burst; a single write never crosses a page boundary.
pub const PAGE_SIZE: u32 = 512;
/// Sector size, the erase granularity.
pub const SECTOR_SIZE: u32 = 256 * 1024;
/// Size of the whole physical array.
pub const TOTAL_CAPACITY: u32 = 64 * 1024 * 1024;
/// Bytes at the start of the array excluded from the block device.
pub const RESERVED_OFFSET: u32 = 256 * 1024;
pub const ERASE_VALUE: u8 = 0xFF;

/// Immutable description of the device layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Geometry {
    pub read_size: u32,
    pub program_size: u32,
    pub page_size: u32,
    pub erase_size: u32,
    pub total_capacity: u32,
    pub reserved_offset: u32,
    pub erase_value: u8,
}

impl Geometry {
    /// 512 Mbit HyperFlash with 256 KiB uniform sectors.
    pub const HYPERFLASH: Geometry = Geometry {
        read_size: READ_SIZE,
        program_size: PROGRAM_SIZE,
        page_size: PAGE_SIZE,
        erase_size: SECTOR_SIZE,
        total_capacity: TOTAL_CAPACITY,
        reserved_offset: RESERVED_OFFSET,
        erase_value: ERASE_VALUE,
    };

    /// Size of the block device address space.
    pub const fn logical_capacity(&self) -> u32 {
        self.total_capacity - self.reserved_offset
    }

    /// Maps a logical address onto the physical array.
    pub const fn translate(&self, addr: u32) -> u32 {
        addr + self.reserved_offset
    }

    pub fn check_read(&self, addr: u32, size: usize) -> Result<(), ParameterError> {
        self.check(addr, size, self.read_size)
    }

    pub fn check_program(&self, addr: u32, size: usize) -> Result<(), ParameterError> {
        self.check(addr, size, self.program_size)
    }

    /// Sizes that are not a whole number of sectors are rejected rather
    /// than rounded.
    pub fn check_erase(&self, addr: u32, size: usize) -> Result<(), ParameterError> {
        self.check(addr, size, self.erase_size)
    }

    fn check(&self, addr: u32, size: usize, granularity: u32) -> Result<(), ParameterError> {
        let size = u32::try_from(size).map_err(|_| ParameterError::OutOfBounds)?;
        if addr % granularity != 0 || size % granularity != 0 {
            return Err(ParameterError::Misaligned);
        }
        match addr.checked_add(size) {
            Some(end) if end <= self.logical_capacity() => Ok(()),
            _ => Err(ParameterError::OutOfBounds),
        }
    }
}
