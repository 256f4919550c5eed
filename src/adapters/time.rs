//! ESP32 time adapter.
//!
//! Provides the monotonic millisecond clock the FSM and the flash driver
//! poll against.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side runs, plus [`SimClock`] for deterministic tests.

use crate::app::ports::ClockPort;

/// Time adapter for the ESP32-S3 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic, wraps at `u64::MAX`).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic, wraps at `u64::MAX`).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl ClockPort for Esp32TimeAdapter {
    fn now_ms(&self) -> u32 {
        // Truncation gives the documented 49.7-day wrap.
        (self.uptime_us() / 1_000) as u32
    }
}

// ───────────────────────────────────────────────────────────────
// Simulated clock (host)
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub use sim::SimClock;

#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::cell::Cell;
    use std::rc::Rc;

    use embedded_hal::delay::DelayNs;

    use crate::app::ports::ClockPort;

    /// Manually driven clock.  Clones share the same time base, so a test
    /// can hold one handle while the code under test owns another.
    ///
    /// With a non-zero step every `now_ms()` call advances time after
    /// reading it, which lets busy-wait loops reach their deadlines.
    /// Delays advance time by exactly the requested amount.
    #[derive(Clone, Default)]
    pub struct SimClock {
        now_us: Rc<Cell<u64>>,
        step_ms: u32,
    }

    impl SimClock {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_step(step_ms: u32) -> Self {
            Self {
                now_us: Rc::default(),
                step_ms,
            }
        }

        pub fn advance(&self, ms: u32) {
            self.now_us.set(self.now_us.get() + u64::from(ms) * 1_000);
        }

        pub fn set(&self, ms: u32) {
            self.now_us.set(u64::from(ms) * 1_000);
        }
    }

    impl ClockPort for SimClock {
        fn now_ms(&self) -> u32 {
            let now = (self.now_us.get() / 1_000) as u32;
            if self.step_ms != 0 {
                self.advance(self.step_ms);
            }
            now
        }
    }

    impl DelayNs for SimClock {
        fn delay_ns(&mut self, ns: u32) {
            // Round up so sub-microsecond bit delays still move time.
            let us = u64::from(ns).div_ceil(1_000);
            self.now_us.set(self.now_us.get() + us);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.advance(ms);
        }
    }
}
