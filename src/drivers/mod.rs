//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod abort;
pub mod buzzer;
pub mod hw_init;
pub mod indicator;
pub mod lcd;
