//! ResetFlash and counter placement.

use colorimeter::app::events::AppEvent;
use colorimeter::config::SystemConfig;
use colorimeter::drivers::abort::AbortFlag;
use colorimeter::fsm::{Event, StateId};

use crate::mock_hw::{MockSensor, MockStorage, RED, StorageCall, board, boot, press, tick_after};

#[test]
fn reset_erases_counter_sector() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = boot(
        MockSensor::new(RED),
        MockStorage::with_word(0, 99),
        &ABORT,
        SystemConfig::default(),
    );
    app.tick(&mut sink);
    board(&mut app).take_console();

    press(&mut app, &mut sink, b'3');
    assert_eq!(app.state(), StateId::ResetFlash);
    assert_eq!(
        board(&mut app).take_console(),
        "3\r\n\r\n[RESET] Erasing FLASH sector...\r\n"
    );

    assert_eq!(app.tick(&mut sink), Some(Event::ResetFinished));
    assert_eq!(app.state(), StateId::Menu);
    assert!(
        board(&mut app)
            .take_console()
            .starts_with("[RESET] Done.\r\n")
    );
    assert_eq!(
        app.context().storage.calls,
        vec![StorageCall::Erase { addr: 0 }]
    );
    assert_eq!(app.context().storage.word(0), 0xFFFF_FFFF);
    assert!(sink.events.contains(&AppEvent::CounterCleared));

    // A cleared counter reads back as zero.
    app.tick(&mut sink);
    board(&mut app).take_console();
    press(&mut app, &mut sink, b'2');
    assert!(
        board(&mut app)
            .take_console()
            .contains("[COUNT] RED count (FLASH) = 0\r\n")
    );
}

#[test]
fn reset_erase_failure_still_returns_to_menu() {
    static ABORT: AbortFlag = AbortFlag::new();
    let mut storage = MockStorage::new();
    storage.fail_erase = true;
    let (mut app, mut sink) = boot(MockSensor::new(RED), storage, &ABORT, SystemConfig::default());
    app.tick(&mut sink);
    press(&mut app, &mut sink, b'3');
    board(&mut app).take_console();

    assert_eq!(app.tick(&mut sink), Some(Event::ResetFinished));
    assert_eq!(app.state(), StateId::Menu);
    assert!(
        board(&mut app)
            .take_console()
            .starts_with("[RESET][ERR] FLASH erase failed\r\n")
    );
    assert_eq!(sink.faults(), 1);
}

#[test]
fn counter_address_is_configurable() {
    static ABORT: AbortFlag = AbortFlag::new();
    let config = SystemConfig {
        counter_addr: 0x1004,
        ..SystemConfig::default()
    };
    let (mut app, mut sink) = boot(MockSensor::new(RED), MockStorage::new(), &ABORT, config);
    app.tick(&mut sink);
    press(&mut app, &mut sink, b'1');
    tick_after(&mut app, &mut sink, 200);
    tick_after(&mut app, &mut sink, 200);

    ABORT.raise();
    app.tick(&mut sink);

    let storage = &app.context().storage;
    assert_eq!(
        storage.calls,
        vec![
            StorageCall::Erase { addr: 0x1000 },
            StorageCall::Program {
                addr: 0x1004,
                data: vec![2, 0, 0, 0],
            },
        ]
    );
    assert_eq!(storage.word(0x1004), 2);
    assert_eq!(storage.word(0), 0xFFFF_FFFF);
}

#[test]
fn second_save_overwrites_first() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = boot(
        MockSensor::new(RED),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );
    for expected in [3u32, 1] {
        app.tick(&mut sink);
        press(&mut app, &mut sink, b'1');
        for _ in 0..expected {
            tick_after(&mut app, &mut sink, 200);
        }
        ABORT.raise();
        app.tick(&mut sink);
        assert_eq!(app.context().storage.word(0), expected);
    }
}
