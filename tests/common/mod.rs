#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use embedded_hal::delay::DelayNs;
use hyperbus_nor_flash_rs::{AccessClass, HyperBus, Timing};

pub const SIM_SECTOR: u32 = 256 * 1024;
pub const SIM_CAPACITY: u32 = 64 * 1024 * 1024;
pub const RESERVED: u32 = 256 * 1024;

const CMD_ADDR_1: u32 = 0x555 << 1;
const CMD_ADDR_2: u32 = 0x2AA << 1;
const READY: u16 = 0x80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Write { addr: u32, value: u16 },
    Read { addr: u32 },
    WriteBlock { addr: u32, len: usize },
    ReadBlock { addr: u32, len: usize },
    Timing { access: AccessClass, timing: Timing },
    MaxLength { access: AccessClass, max_len: u16, enable: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// A command or data cycle arrived in a state that does not accept it.
    ProtocolViolation,
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Unlock1,
    Unlock2,
    ProgramArmed,
    EraseSetup,
    EraseUnlock1,
    EraseUnlock2,
    VcrArmed,
    StatusArmed,
}

/// HyperFlash command interface and a sparse flash array.
///
/// Sectors are only allocated once written, untouched ones read as 0xFF.
#[derive(Debug)]
pub struct SimFlash {
    state: State,
    sectors: BTreeMap<u32, Vec<u8>>,
    pub log: Vec<Transaction>,
    pub vcr: Option<u16>,
    /// Status reads reporting busy after each program or erase.
    pub busy_polls: u32,
    busy_remaining: u32,
    pub never_ready: bool,
    /// Status reads seen since the last command started.
    pub status_reads: u32,
}

impl SimFlash {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            sectors: BTreeMap::new(),
            log: Vec::new(),
            vcr: None,
            busy_polls: 0,
            busy_remaining: 0,
            never_ready: false,
            status_reads: 0,
        }
    }

    /// Reads straight from the physical array, bypassing the bus.
    pub fn peek(&self, addr: u32, len: usize) -> Vec<u8> {
        (0..len as u32).map(|i| self.byte(addr + i)).collect()
    }

    pub fn write_blocks(&self) -> Vec<(u32, usize)> {
        self.log
            .iter()
            .filter_map(|t| match *t {
                Transaction::WriteBlock { addr, len } => Some((addr, len)),
                _ => None,
            })
            .collect()
    }

    pub fn erase_commands(&self) -> Vec<u32> {
        self.log
            .iter()
            .filter_map(|t| match *t {
                Transaction::Write { addr, value: 0x30 } => Some(addr),
                _ => None,
            })
            .collect()
    }

    fn byte(&self, addr: u32) -> u8 {
        let sector = addr / SIM_SECTOR;
        match self.sectors.get(&sector) {
            Some(data) => data[(addr % SIM_SECTOR) as usize],
            None => 0xFF,
        }
    }

    fn byte_mut(&mut self, addr: u32) -> &mut u8 {
        let sector = addr / SIM_SECTOR;
        let data = self
            .sectors
            .entry(sector)
            .or_insert_with(|| vec![0xFF; SIM_SECTOR as usize]);
        &mut data[(addr % SIM_SECTOR) as usize]
    }

    fn check_range(addr: u32, len: usize) -> Result<(), SimError> {
        if addr as usize + len > SIM_CAPACITY as usize {
            return Err(SimError::OutOfRange);
        }
        Ok(())
    }

    fn start_operation(&mut self) {
        self.busy_remaining = self.busy_polls;
        self.status_reads = 0;
    }

    fn on_write(&mut self, addr: u32, value: u16) -> Result<(), SimError> {
        self.state = match (self.state, addr, value) {
            (State::Idle, CMD_ADDR_1, 0xAA) => State::Unlock1,
            (State::Idle, CMD_ADDR_1, 0x70) => State::StatusArmed,
            (State::Unlock1, CMD_ADDR_2, 0x55) => State::Unlock2,
            (State::Unlock2, CMD_ADDR_1, 0xA0) => State::ProgramArmed,
            (State::Unlock2, CMD_ADDR_1, 0x80) => State::EraseSetup,
            (State::Unlock2, CMD_ADDR_1, 0x38) => State::VcrArmed,
            (State::EraseSetup, CMD_ADDR_1, 0xAA) => State::EraseUnlock1,
            (State::EraseUnlock1, CMD_ADDR_2, 0x55) => State::EraseUnlock2,
            (State::EraseUnlock2, sector_addr, 0x30) => {
                Self::check_range(sector_addr, 1)?;
                let sector = sector_addr / SIM_SECTOR;
                self.sectors.remove(&sector);
                self.start_operation();
                State::Idle
            }
            (State::VcrArmed, 0, vcr) => {
                self.vcr = Some(vcr);
                State::Idle
            }
            _ => {
                self.state = State::Idle;
                return Err(SimError::ProtocolViolation);
            }
        };
        Ok(())
    }

    fn on_status_read(&mut self) -> u16 {
        self.status_reads += 1;
        if self.never_ready {
            return 0;
        }
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            return 0;
        }
        READY
    }
}

/// Bus handle onto a shared [`SimFlash`]. Clones see the same device.
#[derive(Debug, Clone)]
pub struct SimBus {
    pub flash: Arc<Mutex<SimFlash>>,
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            flash: Arc::new(Mutex::new(SimFlash::new())),
        }
    }

    pub fn sim(&self) -> std::sync::MutexGuard<'_, SimFlash> {
        self.flash.lock().unwrap()
    }
}

impl HyperBus for SimBus {
    type Error = SimError;

    fn write(&mut self, addr: u32, value: u16, access: AccessClass) -> Result<(), SimError> {
        assert_eq!(access, AccessClass::Memory);
        let mut sim = self.sim();
        sim.log.push(Transaction::Write { addr, value });
        sim.on_write(addr, value)
    }

    fn read(&mut self, addr: u32, access: AccessClass) -> Result<u16, SimError> {
        assert_eq!(access, AccessClass::Memory);
        let mut sim = self.sim();
        sim.log.push(Transaction::Read { addr });
        if sim.state != State::StatusArmed || addr != 0 {
            sim.state = State::Idle;
            return Err(SimError::ProtocolViolation);
        }
        sim.state = State::Idle;
        Ok(sim.on_status_read())
    }

    fn write_block(&mut self, addr: u32, data: &[u8], access: AccessClass) -> Result<(), SimError> {
        assert_eq!(access, AccessClass::Memory);
        let mut sim = self.sim();
        sim.log.push(Transaction::WriteBlock {
            addr,
            len: data.len(),
        });
        if sim.state != State::ProgramArmed {
            sim.state = State::Idle;
            return Err(SimError::ProtocolViolation);
        }
        sim.state = State::Idle;
        SimFlash::check_range(addr, data.len())?;
        // A burst must stay inside one 512-byte write buffer
        if !data.is_empty() && addr / 512 != (addr + data.len() as u32 - 1) / 512 {
            return Err(SimError::ProtocolViolation);
        }
        for (i, &b) in data.iter().enumerate() {
            // Programming only clears bits
            *sim.byte_mut(addr + i as u32) &= b;
        }
        sim.start_operation();
        Ok(())
    }

    fn read_block(&mut self, addr: u32, buf: &mut [u8], access: AccessClass) -> Result<(), SimError> {
        assert_eq!(access, AccessClass::Memory);
        let mut sim = self.sim();
        sim.log.push(Transaction::ReadBlock {
            addr,
            len: buf.len(),
        });
        if sim.state != State::Idle {
            return Err(SimError::ProtocolViolation);
        }
        SimFlash::check_range(addr, buf.len())?;
        for (i, b) in buf.iter_mut().enumerate() {
            *b = sim.byte(addr + i as u32);
        }
        Ok(())
    }

    fn configure_timing(&mut self, access: AccessClass, timing: Timing) -> Result<(), SimError> {
        self.sim().log.push(Transaction::Timing { access, timing });
        Ok(())
    }

    fn configure_max_length(
        &mut self,
        access: AccessClass,
        max_len: u16,
        enable: bool,
    ) -> Result<(), SimError> {
        self.sim().log.push(Transaction::MaxLength {
            access,
            max_len,
            enable,
        });
        Ok(())
    }
}

/// Delay source that returns immediately and counts calls.
#[derive(Debug, Clone, Default)]
pub struct CountingDelay {
    pub calls: Arc<AtomicU32>,
}

impl CountingDelay {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, _ns: u32) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn delay_us(&mut self, _us: u32) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn delay_ms(&mut self, _ms: u32) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}
