//! Persisted red-sample counter.
//!
//! One little-endian `u32` at a fixed flash address.  The storage driver
//! only moves bytes; the meaning of the all-ones word lives here.

use core::fmt;

use crate::error::FlashError;
use crate::storage::BlockStorage;

/// Contents of a word that has been erased but never programmed.
pub const ERASED_WORD: u32 = 0xFFFF_FFFF;

/// Which half of an erase-then-program save failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterError {
    Erase(FlashError),
    Write(FlashError),
}

impl CounterError {
    pub fn flash_error(self) -> FlashError {
        match self {
            Self::Erase(e) | Self::Write(e) => e,
        }
    }
}

impl fmt::Display for CounterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Erase(e) => write!(f, "counter erase failed: {}", e),
            Self::Write(e) => write!(f, "counter write failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistentCounter {
    addr: u32,
}

impl PersistentCounter {
    pub const fn new(addr: u32) -> Self {
        Self { addr }
    }

    pub fn addr(&self) -> u32 {
        self.addr
    }

    /// Read the saved count; a blank word reads as zero.
    pub fn load(&self, storage: &mut impl BlockStorage) -> Result<u32, FlashError> {
        let raw = storage.read_u32(self.addr)?;
        Ok(if raw == ERASED_WORD { 0 } else { raw })
    }

    /// Erase the counter's sector, then program `value`.  Everything else in
    /// that sector is lost.
    pub fn store(&self, storage: &mut impl BlockStorage, value: u32) -> Result<(), CounterError> {
        storage.erase_sector(self.addr).map_err(CounterError::Erase)?;
        storage.write_u32(self.addr, value).map_err(CounterError::Write)
    }

    /// Return the counter to the blank state.
    pub fn clear(&self, storage: &mut impl BlockStorage) -> Result<(), FlashError> {
        storage.erase_sector(self.addr)
    }
}
