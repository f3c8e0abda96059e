use core::cell::RefCell;
use core::fmt::Debug;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::delay::DelayNs;

use crate::chunk::Cursor;
use crate::comms::HyperFlash;
use crate::config::Config;
use crate::error::Error;
use crate::geometry::Geometry;
use crate::traits::{BlockDevice, HyperBus};

/// Block device over a HyperFlash device.
///
/// Logical addresses start after [`Geometry::reserved_offset`]. Every
/// operation holds the lock for its whole duration, status polls included,
/// so a second caller never sees the device mid-command. With a
/// `CriticalSectionRawMutex` that means interrupts stay masked for up to a
/// full sector erase; pick `M` accordingly.
///
/// ```ignore
/// let bd = HyperFlashBlockDevice::<NoopRawMutex, _, _>::new(bus, delay, Config::default())?;
/// bd.init()?;
///
/// let mut buf = [0u8; SECTOR_SIZE as usize];
/// buf[..13].copy_from_slice(b"Hello World!\n");
/// bd.erase(0, bd.erase_size())?;
/// bd.program(0, &buf)?;
/// bd.read(0, &mut buf)?;
/// ```
pub struct HyperFlashBlockDevice<M: RawMutex, B, D> {
    flash: Mutex<M, RefCell<HyperFlash<B, D>>>,
}

impl<M: RawMutex, B, D> Debug for HyperFlashBlockDevice<M, B, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HyperFlashBlockDevice").finish()
    }
}

impl<M, B, D> HyperFlashBlockDevice<M, B, D>
where
    M: RawMutex,
    B: HyperBus,
    D: DelayNs,
{
    pub const GEOMETRY: Geometry = Geometry::HYPERFLASH;

    pub fn new(bus: B, delay: D, config: Config) -> Result<Self, Error<B>> {
        let flash = HyperFlash::new(bus, delay, config)?;
        Ok(Self {
            flash: Mutex::new(RefCell::new(flash)),
        })
    }

    /// Gives back the bus and the delay source.
    pub fn release(self) -> (B, D) {
        self.flash.into_inner().into_inner().release()
    }

    fn with_flash<R>(&self, f: impl FnOnce(&mut HyperFlash<B, D>) -> R) -> R {
        self.flash.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Programs `data` one page-bounded burst at a time.
    ///
    /// On failure the bursts before the failing one are committed and the
    /// rest of the range is undefined.
    fn program_pages(
        flash: &mut HyperFlash<B, D>,
        addr: u32,
        data: &[u8],
    ) -> Result<(), Error<B>> {
        let geometry = Self::GEOMETRY;
        for chunk in Cursor::new(addr, data.len(), geometry.page_size) {
            let phys = geometry.translate(chunk.addr);
            trace!("Program {} bytes at {:#x}", chunk.len, phys);
            flash.program_page(phys, &data[chunk.range()]).inspect_err(|_| {
                error!("Program failed at {:#x}", phys);
            })?;
        }
        Ok(())
    }

    /// Erases `size` bytes one sector at a time, with the same partial
    /// completion behavior as [`Self::program_pages`].
    fn erase_sectors(
        flash: &mut HyperFlash<B, D>,
        addr: u32,
        size: usize,
    ) -> Result<(), Error<B>> {
        let geometry = Self::GEOMETRY;
        for chunk in Cursor::new(addr, size, geometry.erase_size) {
            let phys = geometry.translate(chunk.addr);
            trace!("Erase sector at {:#x}", phys);
            flash.erase_sector_blocking(phys).inspect_err(|_| {
                error!("Erase failed at {:#x}", phys);
            })?;
        }
        Ok(())
    }
}

impl<M, B, D> BlockDevice for HyperFlashBlockDevice<M, B, D>
where
    M: RawMutex,
    B: HyperBus,
    D: DelayNs,
{
    type Error = Error<B>;

    /// Sets the read latency through the volatile configuration register.
    /// The register is not read back.
    fn init(&self) -> Result<(), Error<B>> {
        self.with_flash(|flash| {
            let vcr = flash.config().vcr;
            debug!("Init: VCR={:#x}", vcr);
            flash.write_config(vcr)
        })
    }

    fn deinit(&self) -> Result<(), Error<B>> {
        debug!("Deinit");
        Ok(())
    }

    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<(), Error<B>> {
        let geometry = Self::GEOMETRY;
        geometry.check_read(addr, buf.len())?;
        self.with_flash(|flash| flash.read(geometry.translate(addr), buf))
    }

    fn program(&self, addr: u32, data: &[u8]) -> Result<(), Error<B>> {
        Self::GEOMETRY.check_program(addr, data.len())?;
        self.with_flash(|flash| Self::program_pages(flash, addr, data))
    }

    fn erase(&self, addr: u32, size: u32) -> Result<(), Error<B>> {
        let size = size as usize;
        Self::GEOMETRY.check_erase(addr, size)?;
        self.with_flash(|flash| Self::erase_sectors(flash, addr, size))
    }

    fn read_size(&self) -> u32 {
        Self::GEOMETRY.read_size
    }

    fn program_size(&self) -> u32 {
        Self::GEOMETRY.program_size
    }

    fn erase_size(&self) -> u32 {
        Self::GEOMETRY.erase_size
    }

    fn erase_value(&self) -> Option<u8> {
        Some(Self::GEOMETRY.erase_value)
    }

    fn size(&self) -> u32 {
        Self::GEOMETRY.logical_capacity()
    }

    fn device_type(&self) -> &'static str {
        "HYPERBUSF"
    }
}
