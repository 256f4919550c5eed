//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.  The operator console is not an event
//! sink; these are diagnostics.

use crate::error::Error;
use crate::fsm::StateId;
use crate::sensors::SensorSample;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A scan sample was classified.  `count` is the running red count.
    SampleTaken {
        sample: SensorSample,
        red: bool,
        count: u32,
    },

    /// A scan ended.  `duration_ms` runs from entry to the stop.
    ScanEnded { red_count: u32, duration_ms: u32 },

    /// The red count was written to flash.
    CounterSaved(u32),

    /// The saved count was read back for display.
    CounterLoaded(u32),

    /// The counter sector was erased.
    CounterCleared,

    /// A recoverable I/O failure; the FSM has already reported it to the
    /// operator and picked a safe state.
    Fault(Error),
}
