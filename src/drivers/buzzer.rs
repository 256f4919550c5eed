//! Piezo buzzer on an LEDC PWM channel.
//!
//! The timer frequency is fixed at init (`pins::BUZZER_FREQ_HZ`); a beep is
//! a 50 % duty burst followed by silence.

use embedded_hal::delay::DelayNs;

use super::hw_init::{LEDC_CH_BUZZER, ledc_set};
use crate::app::ports::TonePort;

const DUTY_HALF: u8 = 128;

pub struct Buzzer<D> {
    channel: u32,
    delay: D,
}

impl<D: DelayNs> Buzzer<D> {
    pub fn new(delay: D) -> Self {
        ledc_set(LEDC_CH_BUZZER, 0);
        Self {
            channel: LEDC_CH_BUZZER,
            delay,
        }
    }
}

impl<D: DelayNs> TonePort for Buzzer<D> {
    fn beep(&mut self, duration_ms: u32) {
        ledc_set(self.channel, DUTY_HALF);
        self.delay.delay_ms(duration_ms);
        ledc_set(self.channel, 0);
    }
}
