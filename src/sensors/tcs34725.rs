//! AMS TCS34725 RGB + clear light-to-digital converter.
//!
//! Every register access sets the command bit (0x80).  A 16-bit channel is
//! read low byte first with a repeated start; the low-byte read latches the
//! high byte in the device so the pair is consistent.
//!
//! The bus is any `embedded_hal::i2c::I2c`: the ESP-IDF `I2cDriver` on the
//! board, [`SimTcs34725`](super::sim::SimTcs34725) on the host.  The
//! controller frames each transaction and issues the stop itself, also when
//! it aborts on a missing acknowledge.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{ColorSensorPort, SensorSample};
use crate::error::{BusError, BusStage, SensorError};

/// 7-bit bus address.
pub const ADDRESS: u8 = 0x29;
/// Command register select bit, OR'd into every register address.
pub const COMMAND_BIT: u8 = 0x80;

/// Register map.
pub mod reg {
    pub const ENABLE: u8 = 0x00;
    pub const ATIME: u8 = 0x01;
    pub const CONTROL: u8 = 0x0F;
    pub const ID: u8 = 0x12;
    pub const CDATAL: u8 = 0x14;
    pub const RDATAL: u8 = 0x16;
    pub const GDATAL: u8 = 0x18;
    pub const BDATAL: u8 = 0x1A;
}

/// ENABLE register bits.
pub mod enable {
    /// Power on (oscillator).
    pub const PON: u8 = 0x01;
    /// RGBC ADC enable.
    pub const AEN: u8 = 0x02;
}

/// Oscillator settle time between PON and AEN.
const POWER_ON_SETTLE_MS: u32 = 3;

/// RGBC integration time (ATIME register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrationTime {
    Ms2_4,
    Ms24,
    Ms50,
    Ms154,
    Ms700,
}

impl IntegrationTime {
    pub const fn atime(self) -> u8 {
        match self {
            Self::Ms2_4 => 0xFF,
            Self::Ms24 => 0xF6,
            Self::Ms50 => 0xEB,
            Self::Ms154 => 0xC0,
            Self::Ms700 => 0x00,
        }
    }

    /// Integration time rounded up to whole milliseconds.
    pub const fn millis(self) -> u32 {
        match self {
            Self::Ms2_4 => 3,
            Self::Ms24 => 24,
            Self::Ms50 => 50,
            Self::Ms154 => 154,
            Self::Ms700 => 700,
        }
    }
}

/// Analog gain (CONTROL register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gain {
    X1,
    X4,
    X16,
    X60,
}

impl Gain {
    pub const fn control(self) -> u8 {
        match self {
            Self::X1 => 0x00,
            Self::X4 => 0x01,
            Self::X16 => 0x02,
            Self::X60 => 0x03,
        }
    }
}

/// Attribute a controller error to the part of the transaction that
/// failed.  `payload` names the data phase of the transaction in flight.
fn bus_failure(kind: ErrorKind, payload: BusStage) -> SensorError {
    let (stage, cause) = match kind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => (BusStage::Write, BusError::Nack),
        // ESP-IDF reports every NACK as Unknown.  An absent device fails on
        // its address byte first.
        ErrorKind::NoAcknowledge(_) => (BusStage::Address, BusError::Nack),
        ErrorKind::ArbitrationLoss | ErrorKind::Bus => (BusStage::Start, BusError::Busy),
        ErrorKind::Overrun => (BusStage::Read, BusError::Overrun),
        _ => (payload, BusError::Other),
    };
    SensorError::Bus { stage, cause }
}

pub struct Tcs34725<I, D> {
    i2c: I,
    delay: D,
    integration: IntegrationTime,
    gain: Gain,
}

impl<I: I2c, D: DelayNs> Tcs34725<I, D> {
    pub fn new(i2c: I, delay: D, integration: IntegrationTime, gain: Gain) -> Self {
        Self {
            i2c,
            delay,
            integration,
            gain,
        }
    }

    /// Write one 8-bit register: address+W, command byte, value.
    pub fn write_register(&mut self, register: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(ADDRESS, &[COMMAND_BIT | register, value])
            .map_err(|e| bus_failure(e.kind(), BusStage::Write))
    }

    /// Read a little-endian 16-bit register pair starting at `register`:
    /// address+W, command byte, repeated start, address+R, low (ACK),
    /// high (NACK).
    pub fn read_register16(&mut self, register: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(ADDRESS, &[COMMAND_BIT | register], &mut buf)
            .map_err(|e| bus_failure(e.kind(), BusStage::Read))?;
        let [low, high] = buf;
        Ok((u16::from(high) << 8) | u16::from(low))
    }

    /// Power the oscillator, wait for it to settle, then start the ADC.
    pub fn enable(&mut self) -> Result<(), SensorError> {
        self.write_register(reg::ENABLE, enable::PON)?;
        self.delay.delay_ms(POWER_ON_SETTLE_MS);
        self.write_register(reg::ENABLE, enable::PON | enable::AEN)
    }

    pub fn set_integration_time(&mut self, it: IntegrationTime) -> Result<(), SensorError> {
        self.write_register(reg::ATIME, it.atime())?;
        self.integration = it;
        Ok(())
    }

    pub fn set_gain(&mut self, gain: Gain) -> Result<(), SensorError> {
        self.write_register(reg::CONTROL, gain.control())?;
        self.gain = gain;
        Ok(())
    }
}

impl<I: I2c, D: DelayNs> ColorSensorPort for Tcs34725<I, D> {
    fn init(&mut self) -> Result<(), SensorError> {
        // Writing ENABLE=0 doubles as the presence check.
        match self.write_register(reg::ENABLE, 0x00) {
            Err(SensorError::Bus {
                stage: BusStage::Address,
                cause: BusError::Nack,
            }) => {
                warn!("tcs34725: no device at 0x{:02X}", ADDRESS);
                return Err(SensorError::NotPresent);
            }
            other => other?,
        }
        self.enable()?;
        self.set_integration_time(self.integration)?;
        self.set_gain(self.gain)?;
        info!(
            "tcs34725: enabled (integration={:?}, gain={:?})",
            self.integration, self.gain
        );
        Ok(())
    }

    fn read_sample(&mut self) -> Result<SensorSample, SensorError> {
        Ok(SensorSample {
            clear: self.read_register16(reg::CDATAL)?,
            red: self.read_register16(reg::RDATAL)?,
            green: self.read_register16(reg::GDATAL)?,
            blue: self.read_register16(reg::BDATAL)?,
        })
    }
}
