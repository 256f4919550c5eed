//! Unified error types for the colorimeter firmware.
//!
//! Each driver returns its own small error enum; the application funnels them
//! into [`Error`] when it reports a fault.  All variants are `Copy` so they can
//! travel through the FSM outbox and event sink without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The NOR flash block store failed.
    Flash(FlashError),
    /// The colour sensor transaction failed.
    Sensor(SensorError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flash(e) => write!(f, "flash: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Flash errors
// ---------------------------------------------------------------------------

/// The flash operation that was waiting when a ready-poll gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashOp {
    /// Boot-time or explicit ready check.
    Ready,
    SectorErase,
    PageProgram,
    ChipErase,
}

impl fmt::Display for FlashOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready check"),
            Self::SectorErase => write!(f, "sector erase"),
            Self::PageProgram => write!(f, "page program"),
            Self::ChipErase => write!(f, "chip erase"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    /// `addr + len` exceeds the device capacity.  Raised before any bus
    /// activity.
    OutOfRange { addr: u32, len: usize },
    /// The write-in-progress bit did not clear within the budget.
    Timeout { op: FlashOp, waited_ms: u32 },
    /// The SPI device reported a transfer failure.
    Bus(embedded_hal::spi::ErrorKind),
}

impl fmt::Display for FlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { addr, len } => {
                write!(f, "access out of range (addr=0x{addr:06X}, len={len})")
            }
            Self::Timeout { op, waited_ms } => write!(f, "{op} timed out after {waited_ms} ms"),
            Self::Bus(kind) => write!(f, "SPI bus error: {kind:?}"),
        }
    }
}

impl core::error::Error for FlashError {}

impl From<FlashError> for Error {
    fn from(e: FlashError) -> Self {
        Self::Flash(e)
    }
}

// ---------------------------------------------------------------------------
// I²C bus and sensor errors
// ---------------------------------------------------------------------------

/// Why an I²C transaction was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Arbitration lost or a misplaced start/stop seen on the bus.
    Busy,
    /// The addressed device did not acknowledge a byte.
    Nack,
    /// Received data was not taken out of the controller in time.
    Overrun,
    /// Any other controller failure (timeout, driver error).
    Other,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "bus busy"),
            Self::Nack => write!(f, "no acknowledge"),
            Self::Overrun => write!(f, "receive overrun"),
            Self::Other => write!(f, "controller error"),
        }
    }
}

/// Which part of a register transaction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusStage {
    /// Acquiring the bus.
    Start,
    /// Address byte, in either direction.
    Address,
    /// Command or value byte sent to the device.
    Write,
    /// Bytes clocked in from the device.
    Read,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// A register transaction was aborted; a stop condition was issued.
    Bus { stage: BusStage, cause: BusError },
    /// The device never answered the bring-up presence check.
    NotPresent,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus { stage, cause } => write!(f, "{cause} during {stage:?}"),
            Self::NotPresent => write!(f, "device not present"),
        }
    }
}

impl core::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

/// Convenience alias used throughout the firmware.
pub type Result<T> = core::result::Result<T, Error>;
