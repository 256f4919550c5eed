//! Host-side simulated TCS34725 behind an `embedded_hal::i2c::I2c` bus.
//!
//! Each transaction is replayed byte by byte against a model of the device
//! end of the protocol: address match and acknowledge, the command byte
//! selecting a register pointer, auto-increment on data bytes, and the
//! ACK/NACK handshake on reads.  Channel values are injected with
//! [`SimTcs34725::set_channels`].

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use super::SensorSample;
use super::tcs34725::{ADDRESS, COMMAND_BIT, reg};

/// Bus activity seen by the device, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Start,
    Restart,
    Stop,
    Write(u8),
    Read { ack: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Command,
    WriteData,
    ReadData,
    /// Addressed to someone else; ignore until the next start.
    Unselected,
}

struct DeviceState {
    registers: [u8; 32],
    pointer: u8,
    phase: Phase,
    present: bool,
    nack_reads: bool,
    bus_busy: bool,
    unattributed_nacks: bool,
    events: Vec<BusEvent>,
    writes: Vec<(u8, u8)>,
}

#[derive(Clone)]
pub struct SimTcs34725 {
    state: Rc<RefCell<DeviceState>>,
}

impl Default for SimTcs34725 {
    fn default() -> Self {
        Self::new()
    }
}

impl SimTcs34725 {
    pub fn new() -> Self {
        let mut registers = [0u8; 32];
        registers[reg::ATIME as usize] = 0xFF;
        registers[reg::ID as usize] = 0x44;
        Self {
            state: Rc::new(RefCell::new(DeviceState {
                registers,
                pointer: 0,
                phase: Phase::Idle,
                present: true,
                nack_reads: false,
                bus_busy: false,
                unattributed_nacks: false,
                events: Vec::new(),
                writes: Vec::new(),
            })),
        }
    }

    /// Load the four channel data registers.
    pub fn set_channels(&self, sample: SensorSample) {
        let mut s = self.state.borrow_mut();
        for (base, value) in [
            (reg::CDATAL, sample.clear),
            (reg::RDATAL, sample.red),
            (reg::GDATAL, sample.green),
            (reg::BDATAL, sample.blue),
        ] {
            let [lo, hi] = value.to_le_bytes();
            s.registers[base as usize] = lo;
            s.registers[base as usize + 1] = hi;
        }
    }

    /// Remove the device from the bus: its address is no longer acknowledged.
    pub fn set_present(&self, present: bool) {
        self.state.borrow_mut().present = present;
    }

    /// Refuse read-direction addressing (write transactions still work).
    pub fn set_nack_reads(&self, nack: bool) {
        self.state.borrow_mut().nack_reads = nack;
    }

    /// Make every start fail as if another master held the bus.
    pub fn set_bus_busy(&self, busy: bool) {
        self.state.borrow_mut().bus_busy = busy;
    }

    /// Report NACKs without saying which byte failed, like the ESP-IDF
    /// controller does.
    pub fn set_unattributed_nacks(&self, unattributed: bool) {
        self.state.borrow_mut().unattributed_nacks = unattributed;
    }

    pub fn register(&self, register: u8) -> u8 {
        self.state.borrow().registers[(register & 0x1F) as usize]
    }

    /// Completed register writes as `(register, value)`.
    pub fn register_writes(&self) -> Vec<(u8, u8)> {
        self.state.borrow().writes.clone()
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.state.borrow().events.clone()
    }

    pub fn last_event(&self) -> Option<BusEvent> {
        self.state.borrow().events.last().copied()
    }

    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }
}

impl DeviceState {
    fn nack(&self, source: NoAcknowledgeSource) -> ErrorKind {
        if self.unattributed_nacks {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)
        } else {
            ErrorKind::NoAcknowledge(source)
        }
    }

    fn address(&mut self, address: u8, read: bool) -> Result<(), ErrorKind> {
        self.events.push(BusEvent::Write((address << 1) | u8::from(read)));
        if address != ADDRESS || !self.present || (read && self.nack_reads) {
            self.phase = Phase::Unselected;
            return Err(self.nack(NoAcknowledgeSource::Address));
        }
        self.phase = if read { Phase::ReadData } else { Phase::Command };
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), ErrorKind> {
        self.events.push(BusEvent::Write(byte));
        match self.phase {
            Phase::Command if byte & COMMAND_BIT != 0 => {
                self.pointer = byte & 0x1F;
                self.phase = Phase::WriteData;
                Ok(())
            }
            Phase::WriteData => {
                let p = self.pointer;
                self.registers[p as usize] = byte;
                self.writes.push((p, byte));
                self.pointer = (p + 1) & 0x1F;
                Ok(())
            }
            _ => Err(self.nack(NoAcknowledgeSource::Data)),
        }
    }

    fn read_byte(&mut self, ack: bool) -> u8 {
        self.events.push(BusEvent::Read { ack });
        if self.phase != Phase::ReadData {
            // Nobody drives SDA: the master reads the pull-up.
            return 0xFF;
        }
        let p = self.pointer;
        self.pointer = (p + 1) & 0x1F;
        self.registers[p as usize]
    }

    fn run(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        let mut reading: Option<bool> = None;
        for op in operations.iter_mut() {
            let read = matches!(op, Operation::Read(_));
            if reading != Some(read) {
                if reading.is_some() {
                    self.events.push(BusEvent::Restart);
                }
                self.address(address, read)?;
            }
            reading = Some(read);
            match op {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        self.write_byte(byte)?;
                    }
                }
                Operation::Read(buf) => {
                    let last = buf.len().saturating_sub(1);
                    for (i, slot) in buf.iter_mut().enumerate() {
                        *slot = self.read_byte(i < last);
                    }
                }
            }
        }
        Ok(())
    }
}

impl ErrorType for SimTcs34725 {
    type Error = ErrorKind;
}

impl I2c for SimTcs34725 {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut s = self.state.borrow_mut();
        s.events.push(BusEvent::Start);
        if s.bus_busy {
            return Err(ErrorKind::ArbitrationLoss);
        }
        let result = s.run(address, operations);
        s.events.push(BusEvent::Stop);
        s.phase = Phase::Idle;
        result
    }
}
