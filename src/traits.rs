use crate::config::Timing;

/// Target of a HyperBus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessClass {
    /// The controller's flash channel, used for timing and transfer setup.
    Flash,
    /// Memory-mapped accesses to the flash array and its command interface.
    Memory,
}

/// Raw HyperBus transport.
///
/// Addresses are bus byte addresses. Words are 16 bits wide, which is why
/// device word addresses are shifted left by one before they reach the bus.
pub trait HyperBus {
    type Error;

    /// Writes a single word.
    fn write(&mut self, addr: u32, value: u16, access: AccessClass) -> Result<(), Self::Error>;

    /// Reads a single word.
    fn read(&mut self, addr: u32, access: AccessClass) -> Result<u16, Self::Error>;

    /// Burst write of `data` starting at `addr`.
    fn write_block(&mut self, addr: u32, data: &[u8], access: AccessClass)
        -> Result<(), Self::Error>;

    /// Burst read filling `buf` starting at `addr`.
    fn read_block(&mut self, addr: u32, buf: &mut [u8], access: AccessClass)
        -> Result<(), Self::Error>;

    /// Chip-select and latency timing for `access`.
    fn configure_timing(&mut self, access: AccessClass, timing: Timing) -> Result<(), Self::Error>;

    /// Maximum burst length for `access`.
    fn configure_max_length(
        &mut self,
        access: AccessClass,
        max_len: u16,
        enable: bool,
    ) -> Result<(), Self::Error>;
}

/// A fixed-geometry block device.
///
/// All operations block until the device is done or has timed out.
pub trait BlockDevice {
    type Error;

    /// Brings the device into a usable state.
    fn init(&self) -> Result<(), Self::Error>;

    fn deinit(&self) -> Result<(), Self::Error>;

    /// Reads `buf.len()` bytes starting at `addr`.
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Programs `data` at `addr`. The region must have been erased first.
    fn program(&self, addr: u32, data: &[u8]) -> Result<(), Self::Error>;

    /// Erases `size` bytes starting at `addr`.
    fn erase(&self, addr: u32, size: u32) -> Result<(), Self::Error>;

    fn read_size(&self) -> u32;

    fn program_size(&self) -> u32;

    fn erase_size(&self) -> u32;

    /// Value every byte holds after an erase, if callers may rely on it.
    fn erase_value(&self) -> Option<u8>;

    /// Size of the addressable space in bytes.
    fn size(&self) -> u32;

    /// Short identifier of the device kind.
    fn device_type(&self) -> &'static str;

    fn is_valid_read(&self, addr: u32, size: u32) -> bool {
        is_valid(addr, size, self.read_size(), self.size())
    }

    fn is_valid_program(&self, addr: u32, size: u32) -> bool {
        is_valid(addr, size, self.program_size(), self.size())
    }

    fn is_valid_erase(&self, addr: u32, size: u32) -> bool {
        is_valid(addr, size, self.erase_size(), self.size())
    }
}

fn is_valid(addr: u32, size: u32, granularity: u32, capacity: u32) -> bool {
    addr % granularity == 0
        && size % granularity == 0
        && addr.checked_add(size).is_some_and(|end| end <= capacity)
}
