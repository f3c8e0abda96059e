//! Command sequences follow the Cypress S26KS512S HyperFlash datasheet.
//! Command addresses there are word addresses; they are shifted left by one
//! here to form HyperBus byte addresses.

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;

use crate::config::Config;
use crate::error::Error;
use crate::traits::{AccessClass, HyperBus};

const UNLOCK_ADDR_1: u32 = 0x555 << 1;
const UNLOCK_ADDR_2: u32 = 0x2AA << 1;
const UNLOCK_DATA_1: u16 = 0xAA;
const UNLOCK_DATA_2: u16 = 0x55;
/// The volatile configuration register is loaded through address 0.
const VCR_ADDR: u32 = 0;
/// The status word is read back from address 0 after a status read command.
const STATUS_ADDR: u32 = 0;

#[derive(Clone, Copy)]
enum Opcode {
    /// Arms a single program burst.
    WordProgram = 0xA0,
    /// First half of every erase command.
    EraseSetup = 0x80,
    /// Written to the sector address to start a sector erase.
    SectorErase = 0x30,
    /// Status register read.
    ReadStatus = 0x70,
    /// Load the volatile configuration register.
    LoadVcr = 0x38,
}

bitflags::bitflags! {
    /// Status register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u16 {
        /// Device ready: the last embedded operation has finished.
        const DEVICE_READY = 1 << 7;
        /// The last erase failed.
        const ERASE_STATUS = 1 << 5;
        /// The last program failed.
        const PROGRAM_STATUS = 1 << 4;
    }
}

/// Protocol driver for a HyperFlash device.
///
/// Owns the bus and the delay source. Methods here take physical addresses
/// and perform no parameter validation.
pub struct HyperFlash<B, D> {
    bus: B,
    delay: D,
    config: Config,
}

impl<B, D> Debug for HyperFlash<B, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "HyperFlash")
    }
}

impl<B, D> HyperFlash<B, D>
where
    B: HyperBus,
    D: DelayNs,
{
    /// Takes ownership of the bus and sets up transfer length and timing of
    /// the flash channel.
    pub fn new(mut bus: B, delay: D, config: Config) -> Result<Self, Error<B>> {
        bus.configure_max_length(AccessClass::Flash, config.max_transfer_len, true)
            .map_err(Error::Bus)?;
        bus.configure_timing(AccessClass::Flash, config.timing)
            .map_err(Error::Bus)?;
        debug!(
            "HyperBus configured: max_len={}, latency={}",
            config.max_transfer_len,
            config.timing.latency
        );
        Ok(Self { bus, delay, config })
    }

    /// Gives back the bus and the delay source.
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Writes a word to the command interface
    fn command(&mut self, addr: u32, value: u16) -> Result<(), Error<B>> {
        self.bus
            .write(addr, value, AccessClass::Memory)
            .map_err(Error::Bus)
    }

    /// Two-cycle unlock followed by `opcode`.
    fn unlock(&mut self, opcode: Opcode) -> Result<(), Error<B>> {
        self.command(UNLOCK_ADDR_1, UNLOCK_DATA_1)?;
        self.command(UNLOCK_ADDR_2, UNLOCK_DATA_2)?;
        self.command(UNLOCK_ADDR_1, opcode as u16)
    }

    /// Arms the device for one program burst. The next block write is taken
    /// as program data.
    pub fn program_enable(&mut self) -> Result<(), Error<B>> {
        self.unlock(Opcode::WordProgram)
    }

    /// Starts erasing the sector that contains `addr`.
    ///
    /// Returns as soon as the command is accepted, see [`Self::sync`].
    pub fn erase_sector(&mut self, addr: u32) -> Result<(), Error<B>> {
        self.unlock(Opcode::EraseSetup)?;
        self.command(UNLOCK_ADDR_1, UNLOCK_DATA_1)?;
        self.command(UNLOCK_ADDR_2, UNLOCK_DATA_2)?;
        self.command(addr, Opcode::SectorErase as u16)
    }

    /// Loads the volatile configuration register.
    pub fn write_config(&mut self, value: u16) -> Result<(), Error<B>> {
        self.unlock(Opcode::LoadVcr)?;
        self.command(VCR_ADDR, value)
    }

    /// Reads the status register.
    pub fn read_status(&mut self) -> Result<Status, Error<B>> {
        self.command(UNLOCK_ADDR_1, Opcode::ReadStatus as u16)?;
        let word = self
            .bus
            .read(STATUS_ADDR, AccessClass::Memory)
            .map_err(Error::Bus)?;
        Ok(Status::from_bits_retain(word))
    }

    /// Block until the device reports ready, or give up after
    /// `poll_attempts` status reads.
    pub fn sync(&mut self) -> Result<(), Error<B>> {
        for attempt in 0..self.config.poll_attempts {
            let status = self.read_status()?;
            if status.contains(Status::DEVICE_READY) {
                if status.intersects(Status::ERASE_STATUS | Status::PROGRAM_STATUS) {
                    warn!("Device ready with error bits set: {:#x}", status.bits());
                }
                trace!("Device ready after {} polls", attempt + 1);
                return Ok(());
            }
            self.delay.delay_us(self.config.poll_interval_us);
        }
        error!("Device not ready after {} polls", self.config.poll_attempts);
        Err(Error::DeviceTimeout)
    }

    /// Programs one page-bounded burst and waits for it to finish.
    ///
    /// `data` must not cross a page boundary.
    pub fn program_page(&mut self, addr: u32, data: &[u8]) -> Result<(), Error<B>> {
        self.program_enable()?;
        self.bus
            .write_block(addr, data, AccessClass::Memory)
            .map_err(Error::Bus)?;
        self.sync()
    }

    /// Erases one sector and waits for it to finish.
    pub fn erase_sector_blocking(&mut self, addr: u32) -> Result<(), Error<B>> {
        self.erase_sector(addr)?;
        self.sync()
    }

    /// Reads flash contents into `buf`, starting at `addr`.
    ///
    /// Array reads need no status polling.
    pub fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), Error<B>> {
        self.bus
            .read_block(addr, buf, AccessClass::Memory)
            .map_err(Error::Bus)
    }
}
