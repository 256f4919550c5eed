//! Non-volatile block storage on raw SPI NOR flash.
//!
//! NOR flash is programmed in pages and erased in sectors.  Erase sets every
//! bit of a sector to 1; programming can only clear bits.  Any program that
//! crosses a page boundary wraps inside the page on real parts, so every
//! write is split with [`PageChunks`] before it reaches the chip.
//!
//! ```text
//!  addr ──▶ ┌──────── page ────────┬──────── page ────────┐
//!           │        ▓▓▓▓▓▓▓▓▓▓▓▓▓▓│▓▓▓▓▓▓▓               │
//!           └──────────────────────┴──────────────────────┘
//!                    chunk 0        chunk 1
//! ```

pub mod nor;
#[cfg(not(target_os = "espidf"))]
pub mod sim;

use serde::{Deserialize, Serialize};

use crate::error::FlashError;

// ───────────────────────────────────────────────────────────────
// Geometry
// ───────────────────────────────────────────────────────────────

/// Physical layout of a NOR device.  Sector and page sizes are powers of
/// two and the page size divides the sector size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashGeometry {
    pub capacity: u32,
    pub sector_size: u32,
    pub page_size: u32,
}

impl FlashGeometry {
    /// Spansion S25FL132K: 32 Mbit, 4 KiB sectors, 256 B pages.
    pub const S25FL132K: Self = Self {
        capacity: 4 * 1024 * 1024,
        sector_size: 4096,
        page_size: 256,
    };

    pub const fn is_valid(&self) -> bool {
        self.page_size.is_power_of_two()
            && self.sector_size.is_power_of_two()
            && self.sector_size % self.page_size == 0
            && self.capacity % self.sector_size == 0
    }

    /// Reject any access whose end lies past the device capacity.
    pub fn check_range(&self, addr: u32, len: usize) -> Result<(), FlashError> {
        let end = u64::from(addr).saturating_add(len as u64);
        if end > u64::from(self.capacity) {
            return Err(FlashError::OutOfRange { addr, len });
        }
        Ok(())
    }

    /// Start address of the sector containing `addr`.
    pub const fn sector_base(&self, addr: u32) -> u32 {
        addr & !(self.sector_size - 1)
    }

    /// Split `len` bytes starting at `addr` into page-bounded chunks.
    pub const fn chunks(&self, addr: u32, len: usize) -> PageChunks {
        PageChunks {
            page_size: self.page_size,
            addr,
            offset: 0,
            remaining: len,
        }
    }
}

impl Default for FlashGeometry {
    fn default() -> Self {
        Self::S25FL132K
    }
}

// ───────────────────────────────────────────────────────────────
// Page chunking
// ───────────────────────────────────────────────────────────────

/// One page-bounded slice of a larger write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Device address of the first byte.
    pub addr: u32,
    /// Offset of the first byte within the caller's buffer.
    pub offset: usize,
    pub len: usize,
}

/// Iterator over the chunks of a write, each ending at or before the next
/// page boundary: `len = min(remaining, page - addr % page)`.
#[derive(Debug, Clone)]
pub struct PageChunks {
    page_size: u32,
    addr: u32,
    offset: usize,
    remaining: usize,
}

impl Iterator for PageChunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.remaining == 0 {
            return None;
        }
        let room = (self.page_size - self.addr % self.page_size) as usize;
        let len = self.remaining.min(room);
        let chunk = Chunk {
            addr: self.addr,
            offset: self.offset,
            len,
        };
        self.addr = self.addr.wrapping_add(len as u32);
        self.offset += len;
        self.remaining -= len;
        Some(chunk)
    }
}

// ───────────────────────────────────────────────────────────────
// Timeouts
// ───────────────────────────────────────────────────────────────

/// Ready-poll budgets per operation, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashTimeouts {
    pub sector_erase_ms: u32,
    pub page_program_ms: u32,
    pub init_ms: u32,
    pub chip_erase_ms: u32,
}

impl Default for FlashTimeouts {
    fn default() -> Self {
        Self {
            sector_erase_ms: 2000,
            page_program_ms: 200,
            init_ms: 100,
            chip_erase_ms: 120_000,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Block storage port
// ───────────────────────────────────────────────────────────────

/// Byte-addressed access to an erase-before-write device.
///
/// Implementations range-check every call before touching the bus and never
/// erase implicitly: callers pair [`erase_sector`](Self::erase_sector) with
/// [`program`](Self::program) themselves.
pub trait BlockStorage {
    fn geometry(&self) -> FlashGeometry;

    /// Fill `buf` from `addr`.  Zero-length reads succeed without bus
    /// activity.
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError>;

    /// Erase the sector containing `addr` (the address is aligned down).
    fn erase_sector(&mut self, addr: u32) -> Result<(), FlashError>;

    /// Program `data` at `addr`, page by page.  A failure part-way leaves the
    /// earlier pages written.
    fn program(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError>;

    /// Little-endian u32 read.
    fn read_u32(&mut self, addr: u32) -> Result<u32, FlashError> {
        let mut bytes = [0u8; 4];
        self.read(addr, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Little-endian u32 program.  The target must already be erased.
    fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), FlashError> {
        self.program(addr, &value.to_le_bytes())
    }
}

impl<T: BlockStorage + ?Sized> BlockStorage for &mut T {
    fn geometry(&self) -> FlashGeometry {
        (**self).geometry()
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        (**self).read(addr, buf)
    }

    fn erase_sector(&mut self, addr: u32) -> Result<(), FlashError> {
        (**self).erase_sector(addr)
    }

    fn program(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        (**self).program(addr, data)
    }
}
