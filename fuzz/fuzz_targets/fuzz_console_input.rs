//! Fuzz target: operator console driving `AppService`
//!
//! Each input byte is typed on the console and also decides how far the
//! clock moves before the next tick; `0xFF` presses the stop button.  The
//! service runs against the real flash and sensor drivers on simulated
//! buses and must never panic or leave the indicator lit in the menu.
//!
//! cargo fuzz run fuzz_console_input

#![no_main]

use colorimeter::adapters::board::BoardAdapter;
use colorimeter::adapters::console::SimConsole;
use colorimeter::adapters::time::SimClock;
use colorimeter::app::events::AppEvent;
use colorimeter::app::ports::{EventSink, IndicatorPort, TonePort};
use colorimeter::app::service::AppService;
use colorimeter::config::SystemConfig;
use colorimeter::drivers::abort::AbortFlag;
use colorimeter::drivers::lcd::SimDisplay;
use colorimeter::fsm::StateId;
use colorimeter::sensors::SensorSample;
use colorimeter::sensors::sim::SimTcs34725;
use colorimeter::sensors::tcs34725::Tcs34725;
use colorimeter::storage::FlashGeometry;
use colorimeter::storage::nor::SpiNorFlash;
use colorimeter::storage::sim::SimNorChip;
use libfuzzer_sys::fuzz_target;

static ABORT: AbortFlag = AbortFlag::new();

#[derive(Default)]
struct Led(bool);

impl IndicatorPort for Led {
    fn set(&mut self, on: bool) {
        self.0 = on;
    }

    fn toggle(&mut self) {
        self.0 = !self.0;
    }

    fn is_on(&self) -> bool {
        self.0
    }
}

struct Silent;

impl TonePort for Silent {
    fn beep(&mut self, _duration_ms: u32) {}
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

const GEOMETRY: FlashGeometry = FlashGeometry {
    capacity: 64 * 1024,
    sector_size: 4096,
    page_size: 256,
};

fuzz_target!(|data: &[u8]| {
    ABORT.take();
    let config = SystemConfig::default();

    let chip = SimNorChip::new(GEOMETRY);
    let flash = SpiNorFlash::new(chip, SimClock::with_step(1), GEOMETRY, config.flash_timeouts);

    let tcs = SimTcs34725::new();
    tcs.set_channels(SensorSample::new(1000, 900, 30, 30));
    let sensor = Tcs34725::new(tcs, SimClock::new(), config.integration_time, config.gain);

    let console = SimConsole::new();
    let clock = SimClock::new();
    let board = BoardAdapter::new(
        console.clone(),
        Led::default(),
        Silent,
        SimDisplay::new(),
        clock.clone(),
    );

    let mut sink = Discard;
    let mut app = AppService::new(board, sensor, flash, &ABORT, config);
    app.start(Ok(0), &mut sink);

    for &byte in data {
        if byte == 0xFF {
            ABORT.raise();
        } else {
            console.push_input(&[byte]);
        }
        clock.advance(u32::from(byte) * 10);
        app.tick(&mut sink);

        if app.state() == StateId::Menu {
            assert!(!app.context().board.is_on(), "indicator lit in menu");
        }
    }
});
