//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.  This is the classic embedded C FSM pattern
//! expressed in safe Rust; the handlers are generic over the hardware so
//! the same table runs against device drivers and host simulators.
//!
//! ```text
//!          ┌───['1']──▶ SCAN ──[button | q | no sensor]──┐
//!          │                                              │
//!  MENU ───┼───['2']──▶ SHOW_COUNT ──[blink done]─────────┤
//!    ▲     │                                              │
//!    │     └───['3']──▶ RESET_FLASH ──[erased]────────────┤
//!    │                                                    │
//!    └────────────────────────────────────────────────────┘
//! ```

use core::fmt::Write as _;

use heapless::String;
use log::{info, warn};

use super::context::{BlinkState, DisplayBookkeeping, FsmContext, ScanSession};
use super::{Event, MenuChoice, StateDescriptor, StateId, StopCause};
use crate::app::counter::CounterError;
use crate::app::events::AppEvent;
use crate::app::ports::Board;
use crate::classifier::{RedClassifier, normalize};
use crate::error::Error;
use crate::sensors::ColorSensorPort;
use crate::storage::BlockStorage;

/// Idle text painted at boot and whenever a scan ends.
pub const IDLE_ROWS: [&str; 2] = ["Colorimeter", "READY"];

const MENU_BANNER: &str = "\r\n========================\r\n\
                           \x20COLORIMETER - MENU\r\n\
                           ========================\r\n\
                           1) Start scan\r\n\
                           2) Show RED count\r\n\
                           3) Reset saved data\r\n\
                           ------------------------\r\n\
                           Select: ";

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table<B, S, F>() -> [StateDescriptor<FsmContext<B, S, F>>; StateId::COUNT]
where
    B: Board,
    S: ColorSensorPort,
    F: BlockStorage,
{
    [
        // Index 0: Menu
        StateDescriptor {
            id: StateId::Menu,
            name: "Menu",
            on_enter: Some(menu_enter::<B, S, F>),
            on_exit: None,
            on_update: menu_update::<B, S, F>,
        },
        // Index 1: Scan
        StateDescriptor {
            id: StateId::Scan,
            name: "Scan",
            on_enter: Some(scan_enter::<B, S, F>),
            on_exit: Some(scan_exit::<B, S, F>),
            on_update: scan_update::<B, S, F>,
        },
        // Index 2: ShowCount
        StateDescriptor {
            id: StateId::ShowCount,
            name: "ShowCount",
            on_enter: Some(show_count_enter::<B, S, F>),
            on_exit: Some(show_count_exit::<B, S, F>),
            on_update: show_count_update::<B, S, F>,
        },
        // Index 3: ResetFlash
        StateDescriptor {
            id: StateId::ResetFlash,
            name: "ResetFlash",
            on_enter: Some(reset_enter::<B, S, F>),
            on_exit: None,
            on_update: reset_update::<B, S, F>,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  MENU state: wait for an operator choice on the console
// ═══════════════════════════════════════════════════════════════════════════

fn menu_enter<B: Board, S, F>(ctx: &mut FsmContext<B, S, F>) {
    ctx.board.off();
    ctx.menu_printed = false;
}

fn menu_update<B: Board, S, F>(ctx: &mut FsmContext<B, S, F>) -> Option<Event> {
    if ctx.board.is_on() {
        ctx.board.off();
    }

    if !ctx.menu_printed {
        ctx.board.write_str(MENU_BANNER);
        ctx.menu_printed = true;
    }

    let byte = ctx.board.read_byte()?;

    // Echo, then re-arm the banner whatever the choice was.  The console
    // is text, so a byte outside ASCII is shown as '?'.
    let shown = if byte.is_ascii() { char::from(byte) } else { '?' };
    ctx.board.print(format_args!("{}\r\n", shown));
    ctx.menu_printed = false;

    match MenuChoice::from_byte(byte) {
        Some(choice) => {
            info!("MENU: selected {:?}", choice);
            Some(Event::MenuSelected(choice))
        }
        None => {
            ctx.board.write_str("[MENU] Invalid choice. Press 1,2,3\r\n");
            Some(Event::InvalidChoice)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  SCAN state: sample, classify, count until stopped
// ═══════════════════════════════════════════════════════════════════════════

fn scan_enter<B: Board, S, F>(ctx: &mut FsmContext<B, S, F>) {
    // A press that arrived outside a scan must not end this one.
    if ctx.abort.take() {
        warn!("SCAN: discarding stale abort request");
    }

    let now = ctx.board.now_ms();
    ctx.scan = ScanSession::begin(now);
    ctx.display = DisplayBookkeeping {
        show_green: true,
        last_swap_ms: now,
    };
    ctx.board.clear();

    ctx.board.write_str("[SCAN] Starting...\r\n");
    let beep_ms = ctx.config.scan_beep_ms;
    ctx.board.beep(beep_ms);
}

fn scan_update<B, S, F>(ctx: &mut FsmContext<B, S, F>) -> Option<Event>
where
    B: Board,
    S: ColorSensorPort,
    F: BlockStorage,
{
    // 1. Hardware stop has priority over everything else.
    if ctx.abort.take() {
        let count = ctx.scan.red_count;
        ctx.board.print(format_args!(
            "\r\n[SCAN] Stopped by button. RED count={}\r\n",
            count
        ));
        persist_count(ctx);
        return Some(Event::ScanStopped(StopCause::Button));
    }

    // 2. Nothing to do without a sensor.
    if !ctx.sensor_ok {
        ctx.board.write_str("[SCAN][ERR] Sensor not available\r\n");
        return Some(Event::SensorUnavailable);
    }

    // 3. At most one sample per tick.
    let now = ctx.board.now_ms();
    if now.wrapping_sub(ctx.scan.last_sample_ms) >= ctx.config.sample_period_ms {
        ctx.scan.last_sample_ms = now;
        take_sample(ctx);
    }

    // 4. Console quit.
    match ctx.board.read_byte() {
        Some(b'q' | b'Q') => {
            let count = ctx.scan.red_count;
            ctx.board
                .print(format_args!("[SCAN] Stop. RED count={}\r\n", count));
            if ctx.config.persist_on_console_quit {
                persist_count(ctx);
            }
            Some(Event::ScanStopped(StopCause::Console))
        }
        _ => None,
    }
}

fn scan_exit<B: Board, S, F>(ctx: &mut FsmContext<B, S, F>) {
    ctx.board.write_row(0, IDLE_ROWS[0]);
    ctx.board.write_row(1, IDLE_ROWS[1]);
    let duration_ms = ctx.board.now_ms().wrapping_sub(ctx.scan.start_ms);
    info!(
        "SCAN: ended after {} ms with {} red sample(s)",
        duration_ms, ctx.scan.red_count
    );
    ctx.emit(AppEvent::ScanEnded {
        red_count: ctx.scan.red_count,
        duration_ms,
    });
}

/// Read, classify, count, then refresh the display and console readout.
/// A failed read is reported and skipped; the next period tries again.
fn take_sample<B, S, F>(ctx: &mut FsmContext<B, S, F>)
where
    B: Board,
    S: ColorSensorPort,
{
    let sample = match ctx.sensor.read_sample() {
        Ok(sample) => sample,
        Err(e) => {
            warn!("SCAN: sensor read failed: {}", e);
            ctx.board.write_str("[SCAN][ERR] Read failed\r\n");
            ctx.emit(AppEvent::Fault(Error::Sensor(e)));
            return;
        }
    };

    let red = ctx.config.classifier.is_red(&sample);
    if red {
        ctx.scan.red_count = ctx.scan.red_count.saturating_add(1);
    }

    let rgb = normalize(&sample);
    let now = ctx.board.now_ms();
    if now.wrapping_sub(ctx.display.last_swap_ms) >= ctx.config.display_swap_ms {
        ctx.display.last_swap_ms = now;
        ctx.display.show_green = !ctx.display.show_green;
    }

    let mut row0: String<16> = String::new();
    let mut row1: String<16> = String::new();
    // Both fit in 16 columns.
    let _ = write!(row0, "R:{:03}", rgb.r);
    let _ = if ctx.display.show_green {
        write!(row1, "G:{:03}", rgb.g)
    } else {
        write!(row1, "B:{:03}", rgb.b)
    };
    ctx.board.write_row(0, &row0);
    ctx.board.write_row(1, &row1);

    if ctx.config.echo_samples {
        ctx.board.print(format_args!(
            "C={:5} R={:5} G={:5} B={:5}\r\n",
            sample.clear, sample.red, sample.green, sample.blue
        ));
    }

    let count = ctx.scan.red_count;
    ctx.emit(AppEvent::SampleTaken { sample, red, count });
}

/// Erase the counter sector and write the session count.  Failures are
/// reported; the scan ends either way.
fn persist_count<B: Board, S, F: BlockStorage>(ctx: &mut FsmContext<B, S, F>) {
    let count = ctx.scan.red_count;
    ctx.board.write_str("[SCAN] Saving to FLASH...\r\n");

    match ctx.counter.store(&mut ctx.storage, count) {
        Ok(()) => {
            ctx.board.write_str("[SCAN] Saved.\r\n");
            ctx.emit(AppEvent::CounterSaved(count));
        }
        Err(e) => {
            warn!("SCAN: {}", e);
            let line = match e {
                CounterError::Erase(_) => "[SCAN][ERR] FLASH erase failed\r\n",
                CounterError::Write(_) => "[SCAN][ERR] FLASH write failed\r\n",
            };
            ctx.board.write_str(line);
            ctx.emit(AppEvent::Fault(Error::Flash(e.flash_error())));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  SHOW_COUNT state: replay the saved count on the indicator
// ═══════════════════════════════════════════════════════════════════════════

fn show_count_enter<B: Board, S, F: BlockStorage>(ctx: &mut FsmContext<B, S, F>) {
    let now = ctx.board.now_ms();
    ctx.board.off();

    match ctx.counter.load(&mut ctx.storage) {
        Ok(saved) => {
            ctx.board
                .print(format_args!("\r\n[COUNT] RED count (FLASH) = {}\r\n", saved));
            ctx.blink = BlinkState {
                remaining: 2 * u64::from(saved),
                last_toggle_ms: now,
                read_failed: false,
            };
            ctx.emit(AppEvent::CounterLoaded(saved));
        }
        Err(e) => {
            warn!("COUNT: {}", e);
            ctx.board.write_str("\r\n[COUNT][ERR] FLASH read failed\r\n");
            ctx.blink = BlinkState {
                remaining: 0,
                last_toggle_ms: now,
                read_failed: true,
            };
            ctx.emit(AppEvent::Fault(Error::Flash(e)));
        }
    }
}

fn show_count_update<B: Board, S, F>(ctx: &mut FsmContext<B, S, F>) -> Option<Event> {
    if ctx.blink.read_failed {
        return Some(Event::CounterUnreadable);
    }
    // Nothing saved: straight back, no blink report.
    if ctx.blink.remaining == 0 {
        return Some(Event::BlinkFinished);
    }

    let now = ctx.board.now_ms();
    if now.wrapping_sub(ctx.blink.last_toggle_ms) < ctx.config.blink_period_ms {
        return None;
    }
    ctx.blink.last_toggle_ms = now;
    ctx.board.toggle();
    ctx.blink.remaining -= 1;

    if ctx.blink.remaining == 0 {
        ctx.board.off();
        ctx.board.write_str("[COUNT] Blink done.\r\n");
        return Some(Event::BlinkFinished);
    }
    None
}

fn show_count_exit<B: Board, S, F>(ctx: &mut FsmContext<B, S, F>) {
    ctx.board.off();
}

// ═══════════════════════════════════════════════════════════════════════════
//  RESET_FLASH state: blank the counter sector, one tick
// ═══════════════════════════════════════════════════════════════════════════

fn reset_enter<B: Board, S, F>(ctx: &mut FsmContext<B, S, F>) {
    ctx.board.write_str("\r\n[RESET] Erasing FLASH sector...\r\n");
}

fn reset_update<B: Board, S, F: BlockStorage>(ctx: &mut FsmContext<B, S, F>) -> Option<Event> {
    match ctx.counter.clear(&mut ctx.storage) {
        Ok(()) => {
            ctx.board.write_str("[RESET] Done.\r\n");
            ctx.emit(AppEvent::CounterCleared);
        }
        Err(e) => {
            warn!("RESET: {}", e);
            ctx.board.write_str("[RESET][ERR] FLASH erase failed\r\n");
            ctx.emit(AppEvent::Fault(Error::Flash(e)));
        }
    }
    Some(Event::ResetFinished)
}
