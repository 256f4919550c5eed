//! Operator console adapters.
//!
//! - [`UartConsole`] (device): non-blocking UART via `esp-idf-hal`.
//! - [`SimConsole`] (host): scripted input queue and captured output.

use crate::app::ports::ConsolePort;

// ───────────────────────────────────────────────────────────────
// UART console (device)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use uart::UartConsole;

#[cfg(target_os = "espidf")]
mod uart {
    use esp_idf_hal::delay::NON_BLOCK;
    use esp_idf_hal::uart::UartDriver;
    use log::warn;

    use super::ConsolePort;

    pub struct UartConsole<'d> {
        uart: UartDriver<'d>,
    }

    impl<'d> UartConsole<'d> {
        pub fn new(uart: UartDriver<'d>) -> Self {
            Self { uart }
        }
    }

    impl ConsolePort for UartConsole<'_> {
        fn read_byte(&mut self) -> Option<u8> {
            let mut byte = [0u8; 1];
            match self.uart.read(&mut byte, NON_BLOCK) {
                Ok(1) => Some(byte[0]),
                _ => None,
            }
        }

        fn write_str(&mut self, s: &str) {
            let mut rest = s.as_bytes();
            while !rest.is_empty() {
                match self.uart.write(rest) {
                    Ok(n) => rest = &rest[n..],
                    Err(e) => {
                        warn!("console: UART write failed: {:?}", e);
                        return;
                    }
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulated console (host)
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub use sim::SimConsole;

#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::ConsolePort;

    #[derive(Default)]
    struct Terminal {
        input: VecDeque<u8>,
        output: String,
    }

    /// Clones share the same terminal.
    #[derive(Clone, Default)]
    pub struct SimConsole {
        term: Rc<RefCell<Terminal>>,
    }

    impl SimConsole {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue bytes as if typed by the operator.
        pub fn push_input(&self, bytes: &[u8]) {
            self.term.borrow_mut().input.extend(bytes.iter().copied());
        }

        pub fn pending_input(&self) -> usize {
            self.term.borrow().input.len()
        }

        pub fn output(&self) -> String {
            self.term.borrow().output.clone()
        }

        /// Return everything written so far and clear the capture.
        pub fn take_output(&self) -> String {
            core::mem::take(&mut self.term.borrow_mut().output)
        }
    }

    impl ConsolePort for SimConsole {
        fn read_byte(&mut self) -> Option<u8> {
            self.term.borrow_mut().input.pop_front()
        }

        fn write_str(&mut self, s: &str) {
            self.term.borrow_mut().output.push_str(s);
        }
    }
}
