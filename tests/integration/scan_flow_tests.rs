//! Scan loop: sampling cadence, stop paths, and persistence of the count.

use colorimeter::app::events::AppEvent;
use colorimeter::config::SystemConfig;
use colorimeter::drivers::abort::AbortFlag;
use colorimeter::fsm::{Event, StateId, StopCause};

use crate::mock_hw::{
    GREY, MockSensor, MockStorage, RED, RecordingSink, StorageCall, TestApp, board, boot, press,
    tick_after,
};

/// Boot, select "Start scan" and drop the console output so far.
fn scanning(
    sensor: MockSensor,
    storage: MockStorage,
    abort: &'static AbortFlag,
    config: SystemConfig,
) -> (TestApp, RecordingSink) {
    let (mut app, mut sink) = boot(sensor, storage, abort, config);
    app.tick(&mut sink);
    press(&mut app, &mut sink, b'1');
    assert_eq!(app.state(), StateId::Scan);
    board(&mut app).take_console();
    sink.events.clear();
    (app, sink)
}

fn samples_taken(sink: &RecordingSink) -> usize {
    sink.events
        .iter()
        .filter(|e| matches!(e, AppEvent::SampleTaken { .. }))
        .count()
}

#[test]
fn samples_once_per_period() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = scanning(
        MockSensor::new(GREY),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );

    // No time has passed since entry.
    for _ in 0..10 {
        assert_eq!(app.tick(&mut sink), None);
    }
    assert_eq!(app.context().sensor.reads, 0);

    assert_eq!(tick_after(&mut app, &mut sink, 199), None);
    assert_eq!(app.context().sensor.reads, 0);
    assert_eq!(tick_after(&mut app, &mut sink, 1), None);
    assert_eq!(app.context().sensor.reads, 1);

    for _ in 0..4 {
        tick_after(&mut app, &mut sink, 200);
    }
    assert_eq!(app.context().sensor.reads, 5);
    assert_eq!(samples_taken(&sink), 5);
    assert_eq!(app.red_count(), 0);

    let out = board(&mut app).take_console();
    assert_eq!(out.matches("C= 1000 R=  300 G=  300 B=  300\r\n").count(), 5);
}

#[test]
fn only_red_samples_are_counted() {
    static ABORT: AbortFlag = AbortFlag::new();
    let mut sensor = MockSensor::new(GREY);
    sensor.script.extend([Ok(RED), Ok(GREY), Ok(RED), Ok(RED)]);
    let (mut app, mut sink) =
        scanning(sensor, MockStorage::new(), &ABORT, SystemConfig::default());

    for _ in 0..6 {
        tick_after(&mut app, &mut sink, 200);
    }
    assert_eq!(app.red_count(), 3);
    assert!(sink.events.contains(&AppEvent::SampleTaken {
        sample: RED,
        red: true,
        count: 3,
    }));
    assert!(sink.events.contains(&AppEvent::SampleTaken {
        sample: GREY,
        red: false,
        count: 1,
    }));
}

#[test]
fn button_stop_saves_count_and_restores_idle_display() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = scanning(
        MockSensor::new(RED),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );
    for _ in 0..42 {
        tick_after(&mut app, &mut sink, 200);
    }
    assert_eq!(app.red_count(), 42);
    board(&mut app).take_console();

    ABORT.raise();
    assert_eq!(
        app.tick(&mut sink),
        Some(Event::ScanStopped(StopCause::Button))
    );
    assert_eq!(app.state(), StateId::Menu);
    assert!(!ABORT.is_raised());

    assert_eq!(
        app.context().storage.calls,
        vec![
            StorageCall::Erase { addr: 0 },
            StorageCall::Program {
                addr: 0,
                data: vec![42, 0, 0, 0],
            },
        ]
    );
    assert_eq!(app.context().storage.word(0), 42);

    let out = board(&mut app).take_console();
    assert!(out.starts_with(
        "\r\n[SCAN] Stopped by button. RED count=42\r\n\
         [SCAN] Saving to FLASH...\r\n\
         [SCAN] Saved.\r\n"
    ));
    assert!(sink.events.contains(&AppEvent::CounterSaved(42)));
    assert!(sink.events.contains(&AppEvent::ScanEnded {
        red_count: 42,
        duration_ms: 42 * 200,
    }));
    assert!(sink.events.contains(&AppEvent::StateChanged {
        from: StateId::Scan,
        to: StateId::Menu,
    }));

    let b = board(&mut app);
    assert_eq!(b.row(0), Some("Colorimeter"));
    assert_eq!(b.row(1), Some("READY"));

    // The saved value is what ShowCount reports.
    app.tick(&mut sink);
    board(&mut app).take_console();
    press(&mut app, &mut sink, b'2');
    assert_eq!(app.state(), StateId::ShowCount);
    assert!(
        board(&mut app)
            .take_console()
            .contains("[COUNT] RED count (FLASH) = 42\r\n")
    );
}

#[test]
fn console_quit_does_not_persist_by_default() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = scanning(
        MockSensor::new(RED),
        MockStorage::with_word(0, 7),
        &ABORT,
        SystemConfig::default(),
    );
    for _ in 0..3 {
        tick_after(&mut app, &mut sink, 200);
    }
    board(&mut app).take_console();

    assert_eq!(
        press(&mut app, &mut sink, b'q'),
        Some(Event::ScanStopped(StopCause::Console))
    );
    assert_eq!(app.state(), StateId::Menu);
    assert!(
        board(&mut app)
            .take_console()
            .starts_with("[SCAN] Stop. RED count=3\r\n")
    );
    assert!(app.context().storage.calls.is_empty());
    assert_eq!(app.context().storage.word(0), 7);
}

#[test]
fn console_quit_persists_when_configured() {
    static ABORT: AbortFlag = AbortFlag::new();
    let config = SystemConfig {
        persist_on_console_quit: true,
        ..SystemConfig::default()
    };
    let (mut app, mut sink) =
        scanning(MockSensor::new(RED), MockStorage::with_word(0, 7), &ABORT, config);
    for _ in 0..3 {
        tick_after(&mut app, &mut sink, 200);
    }

    assert_eq!(
        press(&mut app, &mut sink, b'Q'),
        Some(Event::ScanStopped(StopCause::Console))
    );
    assert_eq!(app.context().storage.word(0), 3);
    assert!(board(&mut app).take_console().contains("[SCAN] Saved.\r\n"));
}

#[test]
fn other_keys_do_not_stop_the_scan() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = scanning(
        MockSensor::new(GREY),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );
    for key in [b'1', b'x', b'\r'] {
        assert_eq!(press(&mut app, &mut sink, key), None);
    }
    assert_eq!(app.state(), StateId::Scan);
}

#[test]
fn missing_sensor_ends_scan_immediately() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = scanning(
        MockSensor::absent(),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );

    assert_eq!(app.tick(&mut sink), Some(Event::SensorUnavailable));
    assert_eq!(app.state(), StateId::Menu);
    assert!(
        board(&mut app)
            .take_console()
            .starts_with("[SCAN][ERR] Sensor not available\r\n")
    );
    assert_eq!(app.context().sensor.reads, 0);
}

#[test]
fn button_takes_priority_over_sampling_and_console() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = scanning(
        MockSensor::new(RED),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );
    board(&mut app).type_keys(b"q");
    ABORT.raise();

    assert_eq!(
        tick_after(&mut app, &mut sink, 200),
        Some(Event::ScanStopped(StopCause::Button))
    );
    assert_eq!(app.context().sensor.reads, 0);
    assert_eq!(app.context().storage.word(0), 0);
}

#[test]
fn read_failure_is_reported_without_retry() {
    static ABORT: AbortFlag = AbortFlag::new();
    let mut sensor = MockSensor::new(GREY);
    sensor.script.push_back(Err(MockSensor::read_error()));
    let (mut app, mut sink) =
        scanning(sensor, MockStorage::new(), &ABORT, SystemConfig::default());

    assert_eq!(tick_after(&mut app, &mut sink, 200), None);
    assert_eq!(app.context().sensor.reads, 1);
    assert_eq!(board(&mut app).take_console(), "[SCAN][ERR] Read failed\r\n");
    assert_eq!(sink.faults(), 1);

    // Same period: no second attempt.
    app.tick(&mut sink);
    assert_eq!(app.context().sensor.reads, 1);

    // Next period recovers.
    tick_after(&mut app, &mut sink, 200);
    assert_eq!(app.context().sensor.reads, 2);
    assert_eq!(app.state(), StateId::Scan);
}

#[test]
fn second_row_alternates_green_and_blue() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = scanning(
        MockSensor::new(GREY),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );

    let mut rows = Vec::new();
    for _ in 0..6 {
        tick_after(&mut app, &mut sink, 200);
        let b = board(&mut app);
        assert_eq!(b.row(0), Some("R:077"));
        rows.push(b.row(1).map(str::to_owned));
    }
    let expected = ["G:077", "G:077", "B:077", "B:077", "B:077", "G:077"];
    for (got, want) in rows.iter().zip(expected) {
        assert_eq!(got.as_deref(), Some(want));
    }
}

#[test]
fn stale_button_press_is_discarded_on_entry() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = boot(
        MockSensor::new(RED),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );
    app.tick(&mut sink);
    ABORT.raise();
    press(&mut app, &mut sink, b'1');
    assert!(!ABORT.is_raised());

    tick_after(&mut app, &mut sink, 200);
    assert_eq!(app.state(), StateId::Scan);
    assert_eq!(app.red_count(), 1);
}

#[test]
fn program_failure_is_reported() {
    static ABORT: AbortFlag = AbortFlag::new();
    let mut storage = MockStorage::new();
    storage.fail_program = true;
    let (mut app, mut sink) =
        scanning(MockSensor::new(RED), storage, &ABORT, SystemConfig::default());
    tick_after(&mut app, &mut sink, 200);
    board(&mut app).take_console();

    ABORT.raise();
    app.tick(&mut sink);
    assert_eq!(app.state(), StateId::Menu);
    let out = board(&mut app).take_console();
    assert!(out.contains("[SCAN][ERR] FLASH write failed\r\n"));
    assert!(!out.contains("[SCAN] Saved."));
    assert_eq!(sink.faults(), 1);
}

#[test]
fn erase_failure_skips_program() {
    static ABORT: AbortFlag = AbortFlag::new();
    let mut storage = MockStorage::new();
    storage.fail_erase = true;
    let (mut app, mut sink) =
        scanning(MockSensor::new(RED), storage, &ABORT, SystemConfig::default());

    ABORT.raise();
    app.tick(&mut sink);
    assert!(
        board(&mut app)
            .take_console()
            .contains("[SCAN][ERR] FLASH erase failed\r\n")
    );
    assert_eq!(
        app.context().storage.calls,
        vec![StorageCall::Erase { addr: 0 }]
    );
}
