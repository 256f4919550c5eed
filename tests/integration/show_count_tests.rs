//! ShowCount: read the saved count and replay it on the indicator.

use colorimeter::app::events::AppEvent;
use colorimeter::config::SystemConfig;
use colorimeter::drivers::abort::AbortFlag;
use colorimeter::fsm::{Event, StateId};

use crate::mock_hw::{
    GREY, MockSensor, MockStorage, RecordingSink, TestApp, board, boot, press, tick_after,
};

/// Boot with `storage`, optionally set the clock, and select "Show count".
fn show_count(storage: MockStorage, abort: &'static AbortFlag, now: u32) -> (TestApp, RecordingSink) {
    let (mut app, mut sink) = boot(MockSensor::new(GREY), storage, abort, SystemConfig::default());
    board(&mut app).now = now;
    app.tick(&mut sink);
    board(&mut app).take_console();
    press(&mut app, &mut sink, b'2');
    assert_eq!(app.state(), StateId::ShowCount);
    (app, sink)
}

#[test]
fn blank_counter_reads_as_zero_and_returns_at_once() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = show_count(MockStorage::new(), &ABORT, 0);

    assert_eq!(
        board(&mut app).take_console(),
        "2\r\n\r\n[COUNT] RED count (FLASH) = 0\r\n"
    );
    assert!(sink.events.contains(&AppEvent::CounterLoaded(0)));

    assert_eq!(app.tick(&mut sink), Some(Event::BlinkFinished));
    assert_eq!(app.state(), StateId::Menu);
    let b = board(&mut app);
    assert_eq!(b.toggles(), 0);
    assert!(!b.take_console().contains("Blink done"));
}

#[test]
fn count_is_replayed_as_blinks() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = show_count(MockStorage::with_word(0, 3), &ABORT, 1_000);
    assert!(
        board(&mut app)
            .take_console()
            .contains("[COUNT] RED count (FLASH) = 3\r\n")
    );

    assert_eq!(tick_after(&mut app, &mut sink, 499), None);
    assert_eq!(board(&mut app).toggles(), 0);

    assert_eq!(tick_after(&mut app, &mut sink, 1), None);
    assert_eq!(board(&mut app).toggles(), 1);
    assert!(board(&mut app).led);

    for _ in 0..4 {
        assert_eq!(tick_after(&mut app, &mut sink, 500), None);
    }
    assert_eq!(
        tick_after(&mut app, &mut sink, 500),
        Some(Event::BlinkFinished)
    );
    assert_eq!(app.state(), StateId::Menu);

    let b = board(&mut app);
    assert_eq!(b.toggles(), 6);
    assert!(!b.led);
    assert!(b.take_console().starts_with("[COUNT] Blink done.\r\n"));
}

#[test]
fn unreadable_counter_is_reported() {
    static ABORT: AbortFlag = AbortFlag::new();
    let mut storage = MockStorage::new();
    storage.fail_read = true;
    let (mut app, mut sink) = show_count(storage, &ABORT, 0);

    assert_eq!(
        board(&mut app).take_console(),
        "2\r\n\r\n[COUNT][ERR] FLASH read failed\r\n"
    );
    assert_eq!(sink.faults(), 1);

    assert_eq!(app.tick(&mut sink), Some(Event::CounterUnreadable));
    assert_eq!(app.state(), StateId::Menu);
    assert_eq!(board(&mut app).toggles(), 0);
}

#[test]
fn blink_timing_survives_clock_wrap() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = show_count(MockStorage::with_word(0, 1), &ABORT, u32::MAX - 100);

    assert_eq!(tick_after(&mut app, &mut sink, 500), None);
    assert_eq!(board(&mut app).toggles(), 1);
    assert_eq!(
        tick_after(&mut app, &mut sink, 500),
        Some(Event::BlinkFinished)
    );
    assert!(!board(&mut app).led);
}

#[test]
fn keys_typed_during_blink_wait_for_the_menu() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = show_count(MockStorage::with_word(0, 1), &ABORT, 0);
    board(&mut app).type_keys(b"3");

    tick_after(&mut app, &mut sink, 500);
    tick_after(&mut app, &mut sink, 500);
    assert_eq!(app.state(), StateId::Menu);
    assert_eq!(board(&mut app).input.len(), 1);
}
