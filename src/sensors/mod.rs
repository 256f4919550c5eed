//! Colour sensor drivers.
//!
//! ```text
//!  ColorSensorPort ◀── Tcs34725<I, D> ──▶ embedded_hal::i2c::I2c
//!                                          ├── I2cDriver (I2C0, device)
//!                                          └── SimTcs34725 (host)
//! ```

pub mod tcs34725;

#[cfg(not(target_os = "espidf"))]
pub mod sim;

use crate::error::SensorError;

/// One raw reading of the four photodiode channels.
///
/// The channels are captured by separate register reads, so a sample taken
/// while the ADC is updating may mix two integration cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorSample {
    pub clear: u16,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl SensorSample {
    pub const fn new(clear: u16, red: u16, green: u16, blue: u16) -> Self {
        Self {
            clear,
            red,
            green,
            blue,
        }
    }
}

/// Read-side port: the domain calls this to obtain colour samples.
pub trait ColorSensorPort {
    /// Detect and configure the device.  A failure leaves the sensor unusable
    /// until the next boot.
    fn init(&mut self) -> Result<(), SensorError>;

    fn read_sample(&mut self) -> Result<SensorSample, SensorError>;
}
