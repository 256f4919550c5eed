//! Single-LED indicator on any `embedded-hal` output pin.

use embedded_hal::digital::{OutputPin, PinState};
use log::warn;

use crate::app::ports::IndicatorPort;

/// Active-high LED.  The logical state is tracked here so `is_on` never
/// needs to read the pin back.
pub struct LedIndicator<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> LedIndicator<P> {
    /// Take the pin and drive it low.
    pub fn new(pin: P) -> Self {
        let mut led = Self { pin, on: true };
        led.set(false);
        led
    }
}

impl<P: OutputPin> IndicatorPort for LedIndicator<P> {
    fn set(&mut self, on: bool) {
        if self.pin.set_state(PinState::from(on)).is_err() {
            warn!("indicator: GPIO write failed");
        }
        self.on = on;
    }

    fn toggle(&mut self) {
        self.set(!self.on);
    }

    fn is_on(&self) -> bool {
        self.on
    }
}
