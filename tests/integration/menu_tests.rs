//! Boot report and menu handling.

use colorimeter::app::events::AppEvent;
use colorimeter::app::service::AppService;
use colorimeter::config::SystemConfig;
use colorimeter::drivers::abort::AbortFlag;
use colorimeter::error::{Error, FlashError, FlashOp, SensorError};
use colorimeter::fsm::{Event, MenuChoice, StateId};

use crate::mock_hw::{
    BoardCall, GREY, MockBoard, MockSensor, MockStorage, RecordingSink, board, boot, press,
};

const BANNER_TITLE: &str = " COLORIMETER - MENU\r\n";

#[test]
fn boot_report_lists_flash_and_sensor_status() {
    static ABORT: AbortFlag = AbortFlag::new();
    let mut app = AppService::new(
        MockBoard::new(),
        MockSensor::new(GREY),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );
    let mut sink = RecordingSink::new();
    app.start(Ok(0x02), &mut sink);

    let out = board(&mut app).take_console();
    assert_eq!(
        out,
        "\r\n[APP] Boot\r\n[APP] FLASH OK\r\n[APP] FLASH SR=0x02\r\n[APP] Sensor OK\r\n"
    );
    assert!(app.sensor_ok());
    assert_eq!(app.state(), StateId::Menu);
    assert_eq!(sink.events, vec![AppEvent::Started(StateId::Menu)]);

    let b = board(&mut app);
    assert_eq!(b.row(0), Some("Colorimeter"));
    assert_eq!(b.row(1), Some("READY"));
}

#[test]
fn boot_reports_failures_but_still_reaches_menu() {
    static ABORT: AbortFlag = AbortFlag::new();
    let mut app = AppService::new(
        MockBoard::new(),
        MockSensor::absent(),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );
    let mut sink = RecordingSink::new();
    let flash_err = FlashError::Timeout {
        op: FlashOp::Ready,
        waited_ms: 100,
    };
    app.start(Err(flash_err), &mut sink);

    let out = board(&mut app).take_console();
    assert!(out.contains("[APP][ERR] FLASH init failed: ready check timed out after 100 ms\r\n"));
    assert!(out.contains("[APP][ERR] Sensor FAIL\r\n"));
    assert!(!app.sensor_ok());
    assert_eq!(app.state(), StateId::Menu);
    assert_eq!(
        sink.events,
        vec![
            AppEvent::Fault(Error::Flash(flash_err)),
            AppEvent::Fault(Error::Sensor(SensorError::NotPresent)),
            AppEvent::Started(StateId::Menu),
        ]
    );
}

#[test]
fn banner_is_printed_once_until_rearmed() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = boot(
        MockSensor::new(GREY),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );

    for _ in 0..5 {
        assert_eq!(app.tick(&mut sink), None);
    }
    let out = board(&mut app).take_console();
    assert_eq!(out.matches(BANNER_TITLE).count(), 1);
    assert!(out.ends_with("Select: "));
    assert!(out.contains("1) Start scan\r\n2) Show RED count\r\n3) Reset saved data\r\n"));
}

#[test]
fn invalid_choice_echoes_and_rearms_banner() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = boot(
        MockSensor::new(GREY),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );
    app.tick(&mut sink);
    board(&mut app).take_console();

    assert_eq!(press(&mut app, &mut sink, b'x'), Some(Event::InvalidChoice));
    assert_eq!(app.state(), StateId::Menu);
    assert_eq!(
        board(&mut app).take_console(),
        "x\r\n[MENU] Invalid choice. Press 1,2,3\r\n"
    );

    app.tick(&mut sink);
    assert!(board(&mut app).take_console().contains(BANNER_TITLE));
}

#[test]
fn non_ascii_key_is_echoed_as_one_placeholder() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = boot(
        MockSensor::new(GREY),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );
    app.tick(&mut sink);
    board(&mut app).take_console();

    assert_eq!(press(&mut app, &mut sink, 0xE9), Some(Event::InvalidChoice));
    assert_eq!(
        board(&mut app).take_console(),
        "?\r\n[MENU] Invalid choice. Press 1,2,3\r\n"
    );
}

#[test]
fn choice_one_starts_scan_with_beep() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = boot(
        MockSensor::new(GREY),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );
    app.tick(&mut sink);
    board(&mut app).take_console();

    assert_eq!(
        press(&mut app, &mut sink, b'1'),
        Some(Event::MenuSelected(MenuChoice::StartScan))
    );
    assert_eq!(app.state(), StateId::Scan);
    assert_eq!(board(&mut app).take_console(), "1\r\n[SCAN] Starting...\r\n");
    assert_eq!(board(&mut app).beeps(), vec![400]);
    assert!(sink.events.contains(&AppEvent::StateChanged {
        from: StateId::Menu,
        to: StateId::Scan,
    }));
}

#[test]
fn menu_keeps_indicator_off() {
    static ABORT: AbortFlag = AbortFlag::new();
    let (mut app, mut sink) = boot(
        MockSensor::new(GREY),
        MockStorage::new(),
        &ABORT,
        SystemConfig::default(),
    );
    board(&mut app).led = true;
    app.tick(&mut sink);
    let b = board(&mut app);
    assert!(!b.led);
    assert_eq!(b.calls.last(), Some(&BoardCall::Led(false)));
}
