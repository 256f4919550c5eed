//! Colorimeter Firmware: Main Entry Point
//!
//! Hexagonal architecture driven by a cooperative superloop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BoardAdapter (UART console · LED · buzzer · LCD · clock)      │
//! │  SpiNorFlash (BlockStorage)   Tcs34725 (ColorSensorPort)       │
//! │  LogEventSink (EventSink)     button ISR → SCAN_ABORT          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  FSM: Menu · Scan · ShowCount · ResetFlash             │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use core::time::Duration;

use anyhow::Result;
use log::info;

use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::{config::Config as SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_hal::units::Hertz;

use colorimeter::adapters::board::BoardAdapter;
use colorimeter::adapters::console::UartConsole;
use colorimeter::adapters::log_sink::LogEventSink;
use colorimeter::adapters::time::Esp32TimeAdapter;
use colorimeter::app::service::AppService;
use colorimeter::config::SystemConfig;
use colorimeter::drivers::abort::SCAN_ABORT;
use colorimeter::drivers::buzzer::Buzzer;
use colorimeter::drivers::hw_init;
use colorimeter::drivers::indicator::LedIndicator;
use colorimeter::drivers::lcd::Hd44780;
use colorimeter::pins;
use colorimeter::sensors::tcs34725::Tcs34725;
use colorimeter::storage::nor::SpiNorFlash;
use colorimeter::storage::FlashGeometry;

/// Raw sys-level bring-up: button input, buzzer PWM, button ISR.
fn bring_up_hw() -> colorimeter::error::Result<()> {
    hw_init::init_peripherals()?;
    hw_init::init_isr_service()?;
    Ok(())
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Colorimeter v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let geometry = FlashGeometry::S25FL132K;
    let config = SystemConfig::default();
    config.validate(&geometry)?;

    // ── 3. Peripherals ────────────────────────────────────────
    bring_up_hw()?;
    let peripherals = Peripherals::take()?;

    // SAFETY: each GPIO number below is claimed exactly once, here, and
    // matches the board wiring in `pins`.
    let (flash_sclk, flash_mosi, flash_miso, flash_cs) = unsafe {
        (
            AnyIOPin::new(pins::FLASH_SCLK_GPIO),
            AnyIOPin::new(pins::FLASH_MOSI_GPIO),
            AnyIOPin::new(pins::FLASH_MISO_GPIO),
            AnyIOPin::new(pins::FLASH_CS_GPIO),
        )
    };
    let spi = SpiDriver::new(
        peripherals.spi2,
        flash_sclk,
        flash_mosi,
        Some(flash_miso),
        &SpiDriverConfig::new(),
    )?;
    let spi = SpiDeviceDriver::new(
        spi,
        Some(flash_cs),
        &SpiConfig::new().baudrate(Hertz(pins::FLASH_SPI_HZ)),
    )?;
    let mut flash = SpiNorFlash::new(spi, Esp32TimeAdapter::new(), geometry, config.flash_timeouts);
    let flash_status = flash.init();

    // SAFETY: as above.
    let (sda, scl) = unsafe {
        (
            AnyIOPin::new(pins::SENSOR_SDA_GPIO),
            AnyIOPin::new(pins::SENSOR_SCL_GPIO),
        )
    };
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        sda,
        scl,
        &I2cConfig::new()
            .baudrate(Hertz(pins::SENSOR_I2C_HZ))
            .timeout(Duration::from_millis(pins::SENSOR_I2C_TIMEOUT_MS).into()),
    )?;
    let sensor = Tcs34725::new(i2c, Ets, config.integration_time, config.gain);

    // SAFETY: as above.
    let (tx, rx) = unsafe {
        (
            AnyIOPin::new(pins::CONSOLE_TX_GPIO),
            AnyIOPin::new(pins::CONSOLE_RX_GPIO),
        )
    };
    let uart = UartDriver::new(
        peripherals.uart1,
        tx,
        rx,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(pins::CONSOLE_BAUD)),
    )?;

    // SAFETY: as above.
    let out = |gpio: i32| PinDriver::output(unsafe { AnyOutputPin::new(gpio) });
    let led = LedIndicator::new(out(pins::LED_GPIO)?);
    let [d4, d5, d6, d7] = pins::LCD_DATA_GPIOS;
    let mut lcd = Hd44780::new(
        out(pins::LCD_RS_GPIO)?,
        out(pins::LCD_EN_GPIO)?,
        [out(d4)?, out(d5)?, out(d6)?, out(d7)?],
        Ets,
    );
    lcd.init();

    let board = BoardAdapter::new(
        UartConsole::new(uart),
        led,
        Buzzer::new(FreeRtos),
        lcd,
        Esp32TimeAdapter::new(),
    );

    // ── 4. Application ────────────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(board, sensor, flash, &SCAN_ABORT, config);
    app.start(flash_status, &mut sink);

    info!("Entering superloop");

    // ── 5. Superloop ──────────────────────────────────────────
    loop {
        app.tick(&mut sink);
        // Yield so the idle task can feed the task watchdog.
        FreeRtos::delay_ms(1);
    }
}
