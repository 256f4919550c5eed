//! Application core: pure domain logic, zero direct I/O.
//!
//! This module contains the business rules for the colorimeter: FSM
//! orchestration, counter persistence and event reporting.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod counter;
pub mod events;
pub mod ports;
pub mod service;
