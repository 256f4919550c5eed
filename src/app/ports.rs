//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Operator-facing peripherals (console, display, indicator, buzzer, clock)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! and the FSM handlers consume them via generics, so the domain core never
//! touches hardware directly.  The sensor and storage ports live next to
//! their drivers: [`ColorSensorPort`](crate::sensors::ColorSensorPort) and
//! [`BlockStorage`](crate::storage::BlockStorage).

use core::fmt;

// ───────────────────────────────────────────────────────────────
// Console port (operator serial terminal)
// ───────────────────────────────────────────────────────────────

/// Byte-oriented, non-blocking operator console.
pub trait ConsolePort {
    /// Next received byte, or `None` when nothing is pending.  Never blocks.
    fn read_byte(&mut self) -> Option<u8>;

    /// Write text verbatim (callers supply `\r\n` line endings).
    fn write_str(&mut self, s: &str);

    /// Formatted write, used as `console.print(format_args!(..))`.
    fn print(&mut self, args: fmt::Arguments<'_>) {
        struct Adapter<'a, P: ?Sized>(&'a mut P);

        impl<P: ConsolePort + ?Sized> fmt::Write for Adapter<'_, P> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                self.0.write_str(s);
                Ok(())
            }
        }

        // The adapter never fails, so neither does formatting.
        let _ = fmt::write(&mut Adapter(self), args);
    }
}

// ───────────────────────────────────────────────────────────────
// Indicator port (single LED)
// ───────────────────────────────────────────────────────────────

pub trait IndicatorPort {
    fn set(&mut self, on: bool);
    fn toggle(&mut self);
    fn is_on(&self) -> bool;

    fn on(&mut self) {
        self.set(true);
    }

    fn off(&mut self) {
        self.set(false);
    }
}

// ───────────────────────────────────────────────────────────────
// Tone port (piezo buzzer)
// ───────────────────────────────────────────────────────────────

pub trait TonePort {
    /// Sound for `duration_ms`, then silence.  Blocks for the duration.
    fn beep(&mut self, duration_ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Display port (character matrix)
// ───────────────────────────────────────────────────────────────

/// Two-row character display.  Adapters pad or truncate each row to the
/// panel width.
pub trait DisplayPort {
    fn clear(&mut self);
    fn write_row(&mut self, row: u8, text: &str);
}

// ───────────────────────────────────────────────────────────────
// Clock port (monotonic milliseconds)
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  The value wraps at `u32::MAX`; compare
/// timestamps with `wrapping_sub` only.
pub trait ClockPort {
    fn now_ms(&self) -> u32;
}

impl<C: ClockPort + ?Sized> ClockPort for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Board (everything the state handlers drive directly)
// ───────────────────────────────────────────────────────────────

/// The operator-facing half of the hardware, bundled so FSM handlers take a
/// single `&mut` instead of five.
pub trait Board: ConsolePort + IndicatorPort + TonePort + DisplayPort + ClockPort {}

impl<T> Board for T where T: ConsolePort + IndicatorPort + TonePort + DisplayPort + ClockPort {}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
