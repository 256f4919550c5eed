//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific flow of the
//! application service against mock adapters.  All tests run on the host
//! (x86_64) with no real hardware required.

mod menu_tests;
mod mock_hw;
mod scan_flow_tests;
mod show_count_tests;
mod storage_tests;
