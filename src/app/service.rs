//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the FSM and its shared context.  It exposes a clean,
//! hardware-agnostic API: `start` once, then `tick` from the superloop.
//! All I/O flows through the port traits the context is generic over, so
//! the whole service runs on the host against simulators.
//!
//! ```text
//!  ColorSensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                      │       AppService        │
//!     BlockStorage ◀──▶│   FSM · FsmContext      │
//!                      └────────────────────────┘
//!                                 ▲ ▼
//!                               Board
//! ```

use log::{info, warn};

use crate::config::SystemConfig;
use crate::drivers::abort::AbortFlag;
use crate::error::FlashError;
use crate::fsm::context::FsmContext;
use crate::fsm::states::{IDLE_ROWS, build_state_table};
use crate::fsm::{Event, Fsm, StateId};
use crate::sensors::ColorSensorPort;
use crate::storage::BlockStorage;

use super::events::AppEvent;
use super::ports::{Board, EventSink};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<B, S, F> {
    fsm: Fsm<FsmContext<B, S, F>>,
    ctx: FsmContext<B, S, F>,
}

impl<B, S, F> AppService<B, S, F>
where
    B: Board,
    S: ColorSensorPort,
    F: BlockStorage,
{
    /// Construct the service.
    ///
    /// Does **not** start the FSM: call [`start`](Self::start) next.
    pub fn new(
        board: B,
        sensor: S,
        storage: F,
        abort: &'static AbortFlag,
        config: SystemConfig,
    ) -> Self {
        let ctx = FsmContext::new(board, sensor, storage, abort, config);
        let fsm = Fsm::new(build_state_table(), StateId::Menu);
        Self { fsm, ctx }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Print the boot report, bring up the sensor, paint the idle display
    /// and enter `Menu`.
    ///
    /// `flash_status` is the outcome of the flash driver's own `init()`,
    /// run by the caller because it is the only piece that knows the
    /// concrete driver.  A flash failure is reported but does not stop the
    /// boot; later flash operations fail individually.
    pub fn start(&mut self, flash_status: Result<u8, FlashError>, sink: &mut impl EventSink) {
        let board = &mut self.ctx.board;
        board.write_str("\r\n[APP] Boot\r\n");

        match flash_status {
            Ok(sr) => {
                board.write_str("[APP] FLASH OK\r\n");
                board.print(format_args!("[APP] FLASH SR=0x{:02X}\r\n", sr));
            }
            Err(e) => {
                warn!("flash init failed: {}", e);
                board.print(format_args!("[APP][ERR] FLASH init failed: {}\r\n", e));
                sink.emit(&AppEvent::Fault(e.into()));
            }
        }

        match self.ctx.sensor.init() {
            Ok(()) => {
                self.ctx.sensor_ok = true;
                self.ctx.board.write_str("[APP] Sensor OK\r\n");
            }
            Err(e) => {
                self.ctx.sensor_ok = false;
                warn!("sensor init failed: {}", e);
                self.ctx.board.write_str("[APP][ERR] Sensor FAIL\r\n");
                sink.emit(&AppEvent::Fault(e.into()));
            }
        }

        self.ctx.board.clear();
        self.ctx.board.write_row(0, IDLE_ROWS[0]);
        self.ctx.board.write_row(1, IDLE_ROWS[1]);

        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one cooperative step: one FSM update, then flush the
    /// diagnostics the handlers queued.
    pub fn tick(&mut self, sink: &mut impl EventSink) -> Option<Event> {
        let prev_state = self.fsm.current_state();

        let event = self.fsm.tick(&mut self.ctx);

        for queued in &self.ctx.outbox {
            sink.emit(queued);
        }
        self.ctx.outbox.clear();

        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }
        event
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Whether the boot-time sensor bring-up succeeded.
    pub fn sensor_ok(&self) -> bool {
        self.ctx.sensor_ok
    }

    /// Red count of the current (or last) scan session.
    pub fn red_count(&self) -> u32 {
        self.ctx.scan.red_count
    }

    pub fn context(&self) -> &FsmContext<B, S, F> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut FsmContext<B, S, F> {
        &mut self.ctx
    }
}
