//! Host-side simulated SPI NOR chip.
//!
//! Decodes the same command set as [`super::nor`] and models the behaviour
//! that matters to the driver: erase sets bytes to `0xFF`, program ANDs data
//! into memory and wraps inside the page, the write-enable latch gates every
//! modifying command, and WIP stays set for a few status polls after each
//! erase or program.  Handles are cheap clones over shared state so a test
//! can keep one while the driver owns another.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::spi::{self, ErrorKind, ErrorType, Operation, SpiDevice};

use super::FlashGeometry;
use super::nor::{SR_WEL, SR_WIP, cmd};

/// Commands the chip accepted, in order.  Status polls are not recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimOp {
    WriteEnable,
    Read { addr: u32, len: usize },
    SectorErase { addr: u32 },
    PageProgram { addr: u32, len: usize },
    ChipErase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimSpiError;

impl spi::Error for SimSpiError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

struct ChipState {
    geometry: FlashGeometry,
    memory: Vec<u8>,
    wel: bool,
    busy_polls: u32,
    erase_polls: u32,
    program_polls: u32,
    stuck_busy: bool,
    stall_after: Option<usize>,
    programs_since_arm: usize,
    fail_bus: bool,
    ops: Vec<SimOp>,
    transactions: usize,
    page_violations: usize,
}

#[derive(Clone)]
pub struct SimNorChip {
    state: Rc<RefCell<ChipState>>,
}

impl SimNorChip {
    /// A blank (fully erased) chip.
    pub fn new(geometry: FlashGeometry) -> Self {
        Self {
            state: Rc::new(RefCell::new(ChipState {
                geometry,
                memory: vec![0xFF; geometry.capacity as usize],
                wel: false,
                busy_polls: 0,
                erase_polls: 3,
                program_polls: 1,
                stuck_busy: false,
                stall_after: None,
                programs_since_arm: 0,
                fail_bus: false,
                ops: Vec::new(),
                transactions: 0,
                page_violations: 0,
            })),
        }
    }

    // ── Fault injection ───────────────────────────────────────

    /// Hold WIP set on every status read until cleared.
    pub fn set_stuck_busy(&self, stuck: bool) {
        let mut s = self.state.borrow_mut();
        s.stuck_busy = stuck;
        if !stuck {
            s.busy_polls = 0;
            s.stall_after = None;
        }
    }

    /// Let `n` more page programs complete, then stick busy on the next one.
    pub fn stall_after_programs(&self, n: usize) {
        let mut s = self.state.borrow_mut();
        s.stall_after = Some(n);
        s.programs_since_arm = 0;
    }

    /// Fail every transaction with an SPI error.
    pub fn set_bus_fault(&self, fail: bool) {
        self.state.borrow_mut().fail_bus = fail;
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn ops(&self) -> Vec<SimOp> {
        self.state.borrow().ops.clone()
    }

    pub fn clear_ops(&self) {
        let mut s = self.state.borrow_mut();
        s.ops.clear();
        s.transactions = 0;
    }

    /// SPI transactions seen, including status polls.
    pub fn transaction_count(&self) -> usize {
        self.state.borrow().transactions
    }

    /// Page programs whose data would have wrapped inside the page.
    pub fn page_violations(&self) -> usize {
        self.state.borrow().page_violations
    }

    pub fn peek(&self, addr: u32, len: usize) -> Vec<u8> {
        let s = self.state.borrow();
        let start = addr as usize;
        s.memory[start..start + len].to_vec()
    }

    /// Overwrite memory directly, bypassing erase rules.
    pub fn poke(&self, addr: u32, bytes: &[u8]) {
        let mut s = self.state.borrow_mut();
        let start = addr as usize;
        s.memory[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl ChipState {
    fn status(&mut self) -> u8 {
        let mut sr = if self.wel { SR_WEL } else { 0 };
        if self.stuck_busy {
            sr |= SR_WIP;
        } else if self.busy_polls > 0 {
            self.busy_polls -= 1;
            sr |= SR_WIP;
        }
        sr
    }

    fn busy(&self) -> bool {
        self.stuck_busy || self.busy_polls > 0
    }

    fn execute(&mut self, opcode: u8, addr: u32, data: &[u8], read_len: usize) {
        match opcode {
            cmd::WRITE_ENABLE => {
                self.wel = true;
                self.ops.push(SimOp::WriteEnable);
            }
            cmd::WRITE_DISABLE => self.wel = false,
            cmd::READ_DATA => self.ops.push(SimOp::Read {
                addr,
                len: read_len,
            }),
            cmd::SECTOR_ERASE_4K if self.wel && !self.busy() => {
                let base = self.geometry.sector_base(addr) as usize;
                let end = base + self.geometry.sector_size as usize;
                self.memory[base..end].fill(0xFF);
                self.wel = false;
                self.busy_polls = self.erase_polls;
                self.ops.push(SimOp::SectorErase { addr: base as u32 });
            }
            cmd::PAGE_PROGRAM if self.wel && !self.busy() => {
                let page = self.geometry.page_size;
                let base = addr & !(page - 1);
                let start = addr % page;
                if start as usize + data.len() > page as usize {
                    self.page_violations += 1;
                }
                for (i, byte) in data.iter().enumerate() {
                    let offset = (start + i as u32) % page;
                    self.memory[(base + offset) as usize] &= byte;
                }
                self.wel = false;
                self.busy_polls = self.program_polls;
                if let Some(limit) = self.stall_after {
                    if self.programs_since_arm >= limit {
                        self.stuck_busy = true;
                    }
                    self.programs_since_arm += 1;
                }
                self.ops.push(SimOp::PageProgram {
                    addr,
                    len: data.len(),
                });
            }
            cmd::CHIP_ERASE if self.wel && !self.busy() => {
                self.memory.fill(0xFF);
                self.wel = false;
                self.busy_polls = self.erase_polls;
                self.ops.push(SimOp::ChipErase);
            }
            _ => {}
        }
    }
}

impl ErrorType for SimNorChip {
    type Error = SimSpiError;
}

impl SpiDevice for SimNorChip {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), SimSpiError> {
        let mut s = self.state.borrow_mut();
        s.transactions += 1;
        if s.fail_bus {
            return Err(SimSpiError);
        }

        let mut opcode: Option<u8> = None;
        let mut addr_bytes: Vec<u8> = Vec::with_capacity(3);
        let mut data: Vec<u8> = Vec::new();
        let mut read_len = 0usize;

        let takes_addr = |op: Option<u8>| {
            matches!(
                op,
                Some(cmd::READ_DATA | cmd::PAGE_PROGRAM | cmd::SECTOR_ERASE_4K)
            )
        };

        for op in operations.iter_mut() {
            let written: &[u8] = match op {
                Operation::Write(bytes) => bytes,
                Operation::Transfer(_, bytes) => bytes,
                Operation::Read(buf) | Operation::TransferInPlace(buf) => {
                    match opcode {
                        Some(cmd::READ_STATUS) => {
                            for b in buf.iter_mut() {
                                *b = s.status();
                            }
                        }
                        Some(cmd::READ_DATA) => {
                            let base = addr_from(&addr_bytes);
                            let cap = s.geometry.capacity;
                            for b in buf.iter_mut() {
                                let a = base.wrapping_add(read_len as u32) % cap;
                                *b = s.memory[a as usize];
                                read_len += 1;
                            }
                        }
                        _ => buf.fill(0xFF),
                    }
                    &[]
                }
                Operation::DelayNs(_) => &[],
            };
            for &b in written {
                if opcode.is_none() {
                    opcode = Some(b);
                } else if takes_addr(opcode) && addr_bytes.len() < 3 {
                    addr_bytes.push(b);
                } else {
                    data.push(b);
                }
            }
        }

        if let Some(opcode) = opcode {
            let addr = addr_from(&addr_bytes);
            s.execute(opcode, addr, &data, read_len);
        }
        Ok(())
    }
}

fn addr_from(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}
