//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the diagnostic channel.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::SampleTaken { sample, red, count } => {
                info!(
                    "SAMPLE | C={} R={} G={} B={} | red={} count={}",
                    sample.clear, sample.red, sample.green, sample.blue, red, count,
                );
            }
            AppEvent::ScanEnded {
                red_count,
                duration_ms,
            } => {
                info!("SCAN | ended after {} ms, red={}", duration_ms, red_count);
            }
            AppEvent::CounterSaved(count) => {
                info!("FLASH | counter saved ({})", count);
            }
            AppEvent::CounterLoaded(count) => {
                info!("FLASH | counter loaded ({})", count);
            }
            AppEvent::CounterCleared => {
                info!("FLASH | counter cleared");
            }
            AppEvent::Fault(err) => {
                warn!("FAULT | {}", err);
            }
        }
    }
}
