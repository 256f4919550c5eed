//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements          | Connects to                      |
//! |------------|---------------------|----------------------------------|
//! | `board`    | Board (all below)   | Console + LED + buzzer + LCD     |
//! | `console`  | ConsolePort         | ESP32 UART / host script         |
//! | `log_sink` | EventSink           | Serial log output                |
//! | `time`     | ClockPort           | ESP32 system timer / host clock  |

pub mod board;
pub mod console;
pub mod log_sink;
pub mod time;
