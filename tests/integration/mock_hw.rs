//! Mock hardware for integration tests.
//!
//! Records every board call so tests can assert on the full operator-facing
//! history (console text, LED edges, beeps, display rows) without touching
//! real GPIO/UART registers.  The sensor and storage mocks are scripted.

use std::collections::VecDeque;

use colorimeter::app::events::AppEvent;
use colorimeter::app::ports::{
    ClockPort, ConsolePort, DisplayPort, EventSink, IndicatorPort, TonePort,
};
use colorimeter::app::service::AppService;
use colorimeter::config::SystemConfig;
use colorimeter::drivers::abort::AbortFlag;
use colorimeter::fsm::Event;
use colorimeter::error::{BusError, BusStage, FlashError, FlashOp, SensorError};
use colorimeter::sensors::{ColorSensorPort, SensorSample};
use colorimeter::storage::{BlockStorage, FlashGeometry};

// ── Board call record ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BoardCall {
    Led(bool),
    Toggle,
    Beep(u32),
    Clear,
    Row(u8, String),
}

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    pub calls: Vec<BoardCall>,
    pub console: String,
    pub input: VecDeque<u8>,
    pub now: u32,
    pub led: bool,
    /// Beeps advance `now` by their duration, like the blocking buzzer.
    pub beep_advances_clock: bool,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            console: String::new(),
            input: VecDeque::new(),
            now: 0,
            led: false,
            beep_advances_clock: false,
        }
    }

    pub fn type_keys(&mut self, keys: &[u8]) {
        self.input.extend(keys.iter().copied());
    }

    pub fn take_console(&mut self) -> String {
        std::mem::take(&mut self.console)
    }

    pub fn toggles(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BoardCall::Toggle))
            .count()
    }

    pub fn beeps(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BoardCall::Beep(ms) => Some(*ms),
                _ => None,
            })
            .collect()
    }

    /// Most recent text written to `row`.
    pub fn row(&self, row: u8) -> Option<&str> {
        self.calls.iter().rev().find_map(|c| match c {
            BoardCall::Row(r, text) if *r == row => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsolePort for MockBoard {
    fn read_byte(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn write_str(&mut self, s: &str) {
        self.console.push_str(s);
    }
}

impl IndicatorPort for MockBoard {
    fn set(&mut self, on: bool) {
        self.led = on;
        self.calls.push(BoardCall::Led(on));
    }

    fn toggle(&mut self) {
        self.led = !self.led;
        self.calls.push(BoardCall::Toggle);
    }

    fn is_on(&self) -> bool {
        self.led
    }
}

impl TonePort for MockBoard {
    fn beep(&mut self, duration_ms: u32) {
        self.calls.push(BoardCall::Beep(duration_ms));
        if self.beep_advances_clock {
            self.now = self.now.wrapping_add(duration_ms);
        }
    }
}

impl DisplayPort for MockBoard {
    fn clear(&mut self) {
        self.calls.push(BoardCall::Clear);
    }

    fn write_row(&mut self, row: u8, text: &str) {
        self.calls.push(BoardCall::Row(row, text.to_string()));
    }
}

impl ClockPort for MockBoard {
    fn now_ms(&self) -> u32 {
        self.now
    }
}

// ── MockSensor ────────────────────────────────────────────────

pub struct MockSensor {
    pub present: bool,
    /// Consumed first; when empty, `steady` is returned.
    pub script: VecDeque<Result<SensorSample, SensorError>>,
    pub steady: SensorSample,
    pub reads: usize,
}

#[allow(dead_code)]
impl MockSensor {
    pub fn new(steady: SensorSample) -> Self {
        Self {
            present: true,
            script: VecDeque::new(),
            steady,
            reads: 0,
        }
    }

    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::new(SensorSample::default())
        }
    }

    pub fn read_error() -> SensorError {
        SensorError::Bus {
            stage: BusStage::Read,
            cause: BusError::Nack,
        }
    }
}

impl ColorSensorPort for MockSensor {
    fn init(&mut self) -> Result<(), SensorError> {
        if self.present {
            Ok(())
        } else {
            Err(SensorError::NotPresent)
        }
    }

    fn read_sample(&mut self) -> Result<SensorSample, SensorError> {
        self.reads += 1;
        self.script.pop_front().unwrap_or(Ok(self.steady))
    }
}

// ── MockStorage ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum StorageCall {
    Read { addr: u32, len: usize },
    Erase { addr: u32 },
    Program { addr: u32, data: Vec<u8> },
}

/// In-memory NOR model: erase sets 0xFF, program ANDs.
pub struct MockStorage {
    pub geometry: FlashGeometry,
    pub mem: Vec<u8>,
    pub calls: Vec<StorageCall>,
    pub fail_read: bool,
    pub fail_erase: bool,
    pub fail_program: bool,
}

#[allow(dead_code)]
impl MockStorage {
    /// A small part with the real sector and page sizes.
    pub fn new() -> Self {
        let geometry = FlashGeometry {
            capacity: 64 * 1024,
            sector_size: 4096,
            page_size: 256,
        };
        Self {
            geometry,
            mem: vec![0xFF; geometry.capacity as usize],
            calls: Vec::new(),
            fail_read: false,
            fail_erase: false,
            fail_program: false,
        }
    }

    pub fn with_word(addr: u32, value: u32) -> Self {
        let mut s = Self::new();
        let a = addr as usize;
        s.mem[a..a + 4].copy_from_slice(&value.to_le_bytes());
        s
    }

    pub fn word(&self, addr: u32) -> u32 {
        let a = addr as usize;
        u32::from_le_bytes([self.mem[a], self.mem[a + 1], self.mem[a + 2], self.mem[a + 3]])
    }

    fn timeout(op: FlashOp) -> FlashError {
        FlashError::Timeout { op, waited_ms: 0 }
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStorage for MockStorage {
    fn geometry(&self) -> FlashGeometry {
        self.geometry
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        self.geometry.check_range(addr, buf.len())?;
        self.calls.push(StorageCall::Read { addr, len: buf.len() });
        if self.fail_read {
            return Err(FlashError::Bus(embedded_hal::spi::ErrorKind::Other));
        }
        let a = addr as usize;
        buf.copy_from_slice(&self.mem[a..a + buf.len()]);
        Ok(())
    }

    fn erase_sector(&mut self, addr: u32) -> Result<(), FlashError> {
        if addr >= self.geometry.capacity {
            return Err(FlashError::OutOfRange { addr, len: 0 });
        }
        let base = self.geometry.sector_base(addr);
        self.calls.push(StorageCall::Erase { addr: base });
        if self.fail_erase {
            return Err(Self::timeout(FlashOp::SectorErase));
        }
        let a = base as usize;
        self.mem[a..a + self.geometry.sector_size as usize].fill(0xFF);
        Ok(())
    }

    fn program(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        self.geometry.check_range(addr, data.len())?;
        self.calls.push(StorageCall::Program {
            addr,
            data: data.to_vec(),
        });
        if self.fail_program {
            return Err(Self::timeout(FlashOp::PageProgram));
        }
        for (i, byte) in data.iter().enumerate() {
            self.mem[addr as usize + i] &= *byte;
        }
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::Fault(_)))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Harness ───────────────────────────────────────────────────

pub type TestApp = AppService<MockBoard, MockSensor, MockStorage>;

/// Clearly red: r8 = 230, g8 = b8 = 8.
pub const RED: SensorSample = SensorSample::new(1000, 900, 30, 30);
/// Neutral grey: r8 = g8 = b8 = 77.
pub const GREY: SensorSample = SensorSample::new(1000, 300, 300, 300);

/// Boot the service with a healthy flash and discard the boot report.
#[allow(dead_code)]
pub fn boot(
    sensor: MockSensor,
    storage: MockStorage,
    abort: &'static AbortFlag,
    config: SystemConfig,
) -> (TestApp, RecordingSink) {
    let mut app = AppService::new(MockBoard::new(), sensor, storage, abort, config);
    let mut sink = RecordingSink::new();
    app.start(Ok(0x00), &mut sink);
    app.context_mut().board.take_console();
    (app, sink)
}

pub fn board(app: &mut TestApp) -> &mut MockBoard {
    &mut app.context_mut().board
}

/// Advance the mock clock by `ms`, then run one tick.
#[allow(dead_code)]
pub fn tick_after(app: &mut TestApp, sink: &mut RecordingSink, ms: u32) -> Option<Event> {
    let b = board(app);
    b.now = b.now.wrapping_add(ms);
    app.tick(sink)
}

/// Type `key` and run one tick.
#[allow(dead_code)]
pub fn press(app: &mut TestApp, sink: &mut RecordingSink, key: u8) -> Option<Event> {
    board(app).type_keys(&[key]);
    app.tick(sink)
}
