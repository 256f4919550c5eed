//! HD44780-compatible 16×2 character LCD in 4-bit mode.
//!
//! Write-only wiring (R/W tied low), so every command is followed by the
//! datasheet worst-case execution delay instead of a busy-flag poll.
//!
//! A GPIO write failure is logged once per transfer and the transfer runs
//! to the end; the display is cosmetic and never stalls the caller.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};
use log::warn;

use crate::app::ports::DisplayPort;

pub const COLUMNS: usize = 16;
pub const ROWS: u8 = 2;

mod cmd {
    pub const CLEAR: u8 = 0x01;
    pub const ENTRY_MODE_INCREMENT: u8 = 0x06;
    pub const DISPLAY_ON: u8 = 0x0C;
    pub const FUNCTION_4BIT_2LINE: u8 = 0x28;
    pub const SET_DDRAM: u8 = 0x80;
}

/// DDRAM offset of the first column of each row.
const ROW_OFFSETS: [u8; ROWS as usize] = [0x00, 0x40];

/// Pad or truncate `text` to one display row.  Characters outside printable
/// ASCII are shown as `?`.
pub fn pad_row(text: &str) -> [u8; COLUMNS] {
    let mut row = [b' '; COLUMNS];
    for (slot, ch) in row.iter_mut().zip(text.chars()) {
        *slot = if ch.is_ascii() && !ch.is_ascii_control() {
            ch as u8
        } else {
            b'?'
        };
    }
    row
}

pub struct Hd44780<P, D> {
    rs: P,
    en: P,
    data: [P; 4],
    delay: D,
}

impl<P: OutputPin, D: DelayNs> Hd44780<P, D> {
    /// `data` is D4..D7 in order.
    pub fn new(rs: P, en: P, data: [P; 4], delay: D) -> Self {
        Self { rs, en, data, delay }
    }

    /// Power-on initialisation by instruction (datasheet figure 24).
    pub fn init(&mut self) {
        self.delay.delay_ms(50);
        self.set(false, false);
        let mut ok = true;
        for wait_us in [4500, 150, 150] {
            ok &= self.write_nibble(0x3);
            self.delay.delay_us(wait_us);
        }
        ok &= self.write_nibble(0x2);
        self.delay.delay_us(150);
        if !ok {
            warn!("lcd: GPIO write failed during 4-bit handshake");
        }

        self.command(cmd::FUNCTION_4BIT_2LINE);
        self.command(cmd::DISPLAY_ON);
        self.command(cmd::ENTRY_MODE_INCREMENT);
        self.clear();
    }

    fn set(&mut self, rs: bool, en: bool) {
        let rs_ok = self.rs.set_state(PinState::from(rs)).is_ok();
        let en_ok = self.en.set_state(PinState::from(en)).is_ok();
        if !(rs_ok && en_ok) {
            warn!("lcd: control GPIO write failed");
        }
    }

    /// Present a nibble on D4..D7 and strobe EN.  Returns `false` if any
    /// line could not be driven.
    fn write_nibble(&mut self, nibble: u8) -> bool {
        let mut ok = true;
        for (bit, pin) in self.data.iter_mut().enumerate() {
            ok &= pin.set_state(PinState::from(nibble & (1 << bit) != 0)).is_ok();
        }
        ok &= self.en.set_high().is_ok();
        self.delay.delay_us(1);
        ok &= self.en.set_low().is_ok();
        self.delay.delay_us(50);
        ok
    }

    fn write_byte(&mut self, byte: u8, rs: bool) {
        let mut ok = self.rs.set_state(PinState::from(rs)).is_ok();
        ok &= self.write_nibble(byte >> 4);
        ok &= self.write_nibble(byte & 0x0F);
        if !ok {
            warn!("lcd: GPIO write failed sending 0x{:02X}", byte);
        }
    }

    fn command(&mut self, command: u8) {
        self.write_byte(command, false);
    }
}

impl<P: OutputPin, D: DelayNs> DisplayPort for Hd44780<P, D> {
    fn clear(&mut self) {
        self.command(cmd::CLEAR);
        self.delay.delay_ms(2);
    }

    fn write_row(&mut self, row: u8, text: &str) {
        let Some(&offset) = ROW_OFFSETS.get(row as usize) else {
            warn!("lcd: row {} out of range", row);
            return;
        };
        self.command(cmd::SET_DDRAM | offset);
        for byte in pad_row(text) {
            self.write_byte(byte, true);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub use sim::SimDisplay;

#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{COLUMNS, ROWS, pad_row};
    use crate::app::ports::DisplayPort;

    #[derive(Default)]
    struct Panel {
        rows: [[u8; COLUMNS]; ROWS as usize],
        clears: usize,
    }

    /// In-memory panel; clones share the same contents.
    #[derive(Clone, Default)]
    pub struct SimDisplay {
        panel: Rc<RefCell<Panel>>,
    }

    impl SimDisplay {
        pub fn new() -> Self {
            Self::default()
        }

        /// Row text with the padding trimmed.
        pub fn row(&self, row: u8) -> String {
            let panel = self.panel.borrow();
            String::from_utf8_lossy(&panel.rows[row as usize])
                .trim_end()
                .to_string()
        }

        pub fn clears(&self) -> usize {
            self.panel.borrow().clears
        }
    }

    impl DisplayPort for SimDisplay {
        fn clear(&mut self) {
            let mut panel = self.panel.borrow_mut();
            panel.rows = [[b' '; COLUMNS]; ROWS as usize];
            panel.clears += 1;
        }

        fn write_row(&mut self, row: u8, text: &str) {
            if row < ROWS {
                self.panel.borrow_mut().rows[row as usize] = pad_row(text);
            }
        }
    }
}
