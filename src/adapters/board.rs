//! Board adapter: bundles the operator-facing peripherals behind
//! [`Board`](crate::app::ports::Board).
//!
//! Each field is an independent driver; this type only routes port calls to
//! the right one.  It works unchanged with device drivers and host sims.

use crate::app::ports::{ClockPort, ConsolePort, DisplayPort, IndicatorPort, TonePort};

pub struct BoardAdapter<C, I, T, D, K> {
    pub console: C,
    pub indicator: I,
    pub tone: T,
    pub display: D,
    pub clock: K,
}

impl<C, I, T, D, K> BoardAdapter<C, I, T, D, K> {
    pub fn new(console: C, indicator: I, tone: T, display: D, clock: K) -> Self {
        Self {
            console,
            indicator,
            tone,
            display,
            clock,
        }
    }
}

// ── ConsolePort ───────────────────────────────────────────────

impl<C: ConsolePort, I, T, D, K> ConsolePort for BoardAdapter<C, I, T, D, K> {
    fn read_byte(&mut self) -> Option<u8> {
        self.console.read_byte()
    }

    fn write_str(&mut self, s: &str) {
        self.console.write_str(s);
    }
}

// ── IndicatorPort ─────────────────────────────────────────────

impl<C, I: IndicatorPort, T, D, K> IndicatorPort for BoardAdapter<C, I, T, D, K> {
    fn set(&mut self, on: bool) {
        self.indicator.set(on);
    }

    fn toggle(&mut self) {
        self.indicator.toggle();
    }

    fn is_on(&self) -> bool {
        self.indicator.is_on()
    }
}

// ── TonePort ──────────────────────────────────────────────────

impl<C, I, T: TonePort, D, K> TonePort for BoardAdapter<C, I, T, D, K> {
    fn beep(&mut self, duration_ms: u32) {
        self.tone.beep(duration_ms);
    }
}

// ── DisplayPort ───────────────────────────────────────────────

impl<C, I, T, D: DisplayPort, K> DisplayPort for BoardAdapter<C, I, T, D, K> {
    fn clear(&mut self) {
        self.display.clear();
    }

    fn write_row(&mut self, row: u8, text: &str) {
        self.display.write_row(row, text);
    }
}

// ── ClockPort ─────────────────────────────────────────────────

impl<C, I, T, D, K: ClockPort> ClockPort for BoardAdapter<C, I, T, D, K> {
    fn now_ms(&self) -> u32 {
        self.clock.now_ms()
    }
}
