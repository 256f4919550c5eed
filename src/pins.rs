//! GPIO / peripheral pin assignments for the colorimeter board (ESP32-S3).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Serial NOR flash (S25FL132K) on SPI2
// ---------------------------------------------------------------------------

pub const FLASH_SCLK_GPIO: i32 = 12;
pub const FLASH_MOSI_GPIO: i32 = 11;
pub const FLASH_MISO_GPIO: i32 = 13;
/// Chip select, driven by the SPI device driver (active LOW).
pub const FLASH_CS_GPIO: i32 = 10;
/// SPI clock for the flash.  The part is rated far higher; the board
/// wiring is not.
pub const FLASH_SPI_HZ: u32 = 10_000_000;

// ---------------------------------------------------------------------------
// Colour sensor (TCS34725) on I2C0
// ---------------------------------------------------------------------------

/// External 4.7 kΩ pull-ups.
pub const SENSOR_SDA_GPIO: i32 = 8;
pub const SENSOR_SCL_GPIO: i32 = 9;
/// Standard-mode bus clock.
pub const SENSOR_I2C_HZ: u32 = 100_000;
/// Longest a single transaction may hold the bus, clock stretching included.
pub const SENSOR_I2C_TIMEOUT_MS: u64 = 10;

// ---------------------------------------------------------------------------
// Operator console (UART1, 115200 8N1)
// ---------------------------------------------------------------------------

pub const CONSOLE_TX_GPIO: i32 = 39;
pub const CONSOLE_RX_GPIO: i32 = 40;
pub const CONSOLE_BAUD: u32 = 115_200;

// ---------------------------------------------------------------------------
// Indicator LED, buzzer, button
// ---------------------------------------------------------------------------

/// Red indicator LED (active HIGH).
pub const LED_GPIO: i32 = 2;

/// Piezo buzzer on LEDC channel 0.
pub const BUZZER_GPIO: i32 = 4;
pub const BUZZER_FREQ_HZ: u32 = 2_000;

/// Scan-stop push button to ground, internal pull-up, falling-edge ISR.
pub const BUTTON_GPIO: i32 = 0;

// ---------------------------------------------------------------------------
// HD44780 16×2 LCD, 4-bit write-only
// ---------------------------------------------------------------------------

pub const LCD_RS_GPIO: i32 = 14;
pub const LCD_EN_GPIO: i32 = 15;
/// D4..D7 in order.
pub const LCD_DATA_GPIOS: [i32; 4] = [16, 17, 18, 21];
