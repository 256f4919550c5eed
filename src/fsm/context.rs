//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It owns the board, the sensor and the block store, plus the
//! per-state bookkeeping and configuration.  Think of it as the
//! "blackboard" in a blackboard architecture.

use log::warn;

use crate::app::counter::PersistentCounter;
use crate::app::events::AppEvent;
use crate::config::SystemConfig;
use crate::drivers::abort::AbortFlag;

/// Diagnostics queued by handlers, drained by the service after each tick.
pub const OUTBOX_CAPACITY: usize = 8;

// ---------------------------------------------------------------------------
// Per-state bookkeeping
// ---------------------------------------------------------------------------

/// One scan from entry to stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSession {
    pub start_ms: u32,
    pub last_sample_ms: u32,
    pub red_count: u32,
}

impl ScanSession {
    pub fn begin(now_ms: u32) -> Self {
        Self {
            start_ms: now_ms,
            last_sample_ms: now_ms,
            red_count: 0,
        }
    }
}

/// Row 1 alternates between the green and blue readouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayBookkeeping {
    pub show_green: bool,
    pub last_swap_ms: u32,
}

/// ShowCount replay state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlinkState {
    /// Toggles left; `2 × count` at entry.
    pub remaining: u64,
    pub last_toggle_ms: u32,
    /// The counter could not be read on entry.
    pub read_failed: bool,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
///
/// `B` is the operator-facing board, `S` the colour sensor, `F` the block
/// store holding the persisted counter.
pub struct FsmContext<B, S, F> {
    // -- Hardware --
    pub board: B,
    pub sensor: S,
    pub storage: F,
    /// Set from the button ISR, consumed by the Scan handler.
    pub abort: &'static AbortFlag,

    // -- Configuration --
    pub config: SystemConfig,
    pub counter: PersistentCounter,

    // -- Status --
    /// Result of the boot-time sensor bring-up.
    pub sensor_ok: bool,
    /// The menu banner has been printed since the menu was last armed.
    pub menu_printed: bool,

    // -- Per-state --
    pub scan: ScanSession,
    pub display: DisplayBookkeeping,
    pub blink: BlinkState,

    // -- Diagnostics --
    pub outbox: heapless::Vec<AppEvent, OUTBOX_CAPACITY>,
}

impl<B, S, F> FsmContext<B, S, F> {
    pub fn new(
        board: B,
        sensor: S,
        storage: F,
        abort: &'static AbortFlag,
        config: SystemConfig,
    ) -> Self {
        let counter = PersistentCounter::new(config.counter_addr);
        Self {
            board,
            sensor,
            storage,
            abort,
            config,
            counter,
            sensor_ok: false,
            menu_printed: false,
            scan: ScanSession::default(),
            display: DisplayBookkeeping::default(),
            blink: BlinkState::default(),
            outbox: heapless::Vec::new(),
        }
    }

    /// Queue a diagnostic event.  Dropped with a warning if the outbox is
    /// full; diagnostics never block the state machine.
    pub fn emit(&mut self, event: AppEvent) {
        if self.outbox.push(event).is_err() {
            warn!("FSM outbox full, dropping {:?}", event);
        }
    }
}
