//! Scan-abort request raised from the button interrupt.
//!
//! The ISR only stores `true`; the main loop consumes the request with
//! [`AbortFlag::take`], which clears it in the same atomic step so a press
//! that lands between check and clear is never lost.

use core::sync::atomic::{AtomicBool, Ordering};

pub struct AbortFlag(AtomicBool);

impl AbortFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// ISR side.  Lock-free, safe in interrupt context.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Main-loop side: return the pending request and clear it.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for AbortFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// The flag wired to the hardware button.
pub static SCAN_ABORT: AbortFlag = AbortFlag::new();

/// ISR handler: register this on the button GPIO falling edge.
pub fn abort_isr_handler() {
    SCAN_ABORT.raise();
}
