//! SPI NOR flash driver (S25FL1xxK / W25Qxx command set).
//!
//! Every command is a single `SpiDevice` transaction so chip-select framing
//! is owned by the HAL.  Busy-waits poll the status register against the
//! injected [`ClockPort`] and give up at a hard deadline; nothing here
//! retries.

use embedded_hal::spi::{Operation, SpiDevice};
use log::{debug, info, warn};

use super::{BlockStorage, FlashGeometry, FlashTimeouts};
use crate::app::ports::ClockPort;
use crate::error::{FlashError, FlashOp};

/// Opcodes shared by the common 3-byte-address serial NOR parts.
pub mod cmd {
    pub const WRITE_ENABLE: u8 = 0x06;
    pub const WRITE_DISABLE: u8 = 0x04;
    pub const READ_STATUS: u8 = 0x05;
    pub const READ_DATA: u8 = 0x03;
    pub const PAGE_PROGRAM: u8 = 0x02;
    pub const SECTOR_ERASE_4K: u8 = 0x20;
    pub const CHIP_ERASE: u8 = 0xC7;
}

/// Status register: write in progress.
pub const SR_WIP: u8 = 0x01;
/// Status register: write enable latch.
pub const SR_WEL: u8 = 0x02;

fn bus<E: embedded_hal::spi::Error>(e: E) -> FlashError {
    FlashError::Bus(e.kind())
}

fn header(opcode: u8, addr: u32) -> [u8; 4] {
    [opcode, (addr >> 16) as u8, (addr >> 8) as u8, addr as u8]
}

pub struct SpiNorFlash<SPI, C> {
    spi: SPI,
    clock: C,
    geometry: FlashGeometry,
    timeouts: FlashTimeouts,
}

impl<SPI: SpiDevice, C: ClockPort> SpiNorFlash<SPI, C> {
    pub fn new(spi: SPI, clock: C, geometry: FlashGeometry, timeouts: FlashTimeouts) -> Self {
        debug_assert!(geometry.is_valid(), "invalid flash geometry");
        Self {
            spi,
            clock,
            geometry,
            timeouts,
        }
    }

    /// Wait for any operation left running across a reset, then return the
    /// status register for the boot report.
    pub fn init(&mut self) -> Result<u8, FlashError> {
        self.poll_ready(FlashOp::Ready, self.timeouts.init_ms)?;
        let sr = self.read_status()?;
        info!("nor: ready, SR=0x{:02X}", sr);
        Ok(sr)
    }

    pub fn read_status(&mut self) -> Result<u8, FlashError> {
        let mut sr = [0u8];
        self.spi
            .transaction(&mut [
                Operation::Write(&[cmd::READ_STATUS]),
                Operation::Read(&mut sr),
            ])
            .map_err(bus)?;
        Ok(sr[0])
    }

    /// Poll until WIP clears.  `timeout_ms == 0` waits forever.
    pub fn wait_ready(&mut self, timeout_ms: u32) -> Result<(), FlashError> {
        self.poll_ready(FlashOp::Ready, timeout_ms)
    }

    /// Erase the whole device.  Takes tens of seconds on a 4 MiB part.
    pub fn chip_erase(&mut self) -> Result<(), FlashError> {
        info!("nor: chip erase started");
        self.write_enable()?;
        self.spi.write(&[cmd::CHIP_ERASE]).map_err(bus)?;
        self.poll_ready(FlashOp::ChipErase, self.timeouts.chip_erase_ms)?;
        info!("nor: chip erase done");
        Ok(())
    }

    fn write_enable(&mut self) -> Result<(), FlashError> {
        self.spi.write(&[cmd::WRITE_ENABLE]).map_err(bus)
    }

    fn poll_ready(&mut self, op: FlashOp, timeout_ms: u32) -> Result<(), FlashError> {
        let start = self.clock.now_ms();
        loop {
            if self.read_status()? & SR_WIP == 0 {
                return Ok(());
            }
            let waited_ms = self.clock.now_ms().wrapping_sub(start);
            if timeout_ms != 0 && waited_ms >= timeout_ms {
                warn!("nor: {} still busy after {} ms", op, waited_ms);
                return Err(FlashError::Timeout { op, waited_ms });
            }
            core::hint::spin_loop();
        }
    }
}

impl<SPI: SpiDevice, C: ClockPort> BlockStorage for SpiNorFlash<SPI, C> {
    fn geometry(&self) -> FlashGeometry {
        self.geometry
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        self.geometry.check_range(addr, buf.len())?;
        if buf.is_empty() {
            return Ok(());
        }
        self.spi
            .transaction(&mut [
                Operation::Write(&header(cmd::READ_DATA, addr)),
                Operation::Read(buf),
            ])
            .map_err(bus)
    }

    fn erase_sector(&mut self, addr: u32) -> Result<(), FlashError> {
        if addr >= self.geometry.capacity {
            return Err(FlashError::OutOfRange { addr, len: 0 });
        }
        let base = self.geometry.sector_base(addr);
        debug!("nor: erase sector 0x{:06X}", base);
        self.write_enable()?;
        self.spi
            .write(&header(cmd::SECTOR_ERASE_4K, base))
            .map_err(bus)?;
        self.poll_ready(FlashOp::SectorErase, self.timeouts.sector_erase_ms)
    }

    fn program(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        self.geometry.check_range(addr, data.len())?;
        for chunk in self.geometry.chunks(addr, data.len()) {
            let bytes = &data[chunk.offset..chunk.offset + chunk.len];
            self.write_enable()?;
            self.spi
                .transaction(&mut [
                    Operation::Write(&header(cmd::PAGE_PROGRAM, chunk.addr)),
                    Operation::Write(bytes),
                ])
                .map_err(bus)?;
            self.poll_ready(FlashOp::PageProgram, self.timeouts.page_program_ms)?;
        }
        Ok(())
    }
}
