//! System configuration parameters
//!
//! All tunable parameters for the colorimeter.  The firmware boots with
//! [`SystemConfig::default`]; the serde derives let host tooling produce and
//! inspect alternative profiles.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::classifier::ClassifierPolicy;
use crate::sensors::tcs34725::{Gain, IntegrationTime};
use crate::storage::{FlashGeometry, FlashTimeouts};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Minimum spacing between sensor samples while scanning (milliseconds)
    pub sample_period_ms: u32,
    /// Indicator toggle interval when replaying the saved count (milliseconds)
    pub blink_period_ms: u32,
    /// Interval between the G and B readouts on display row 1 (milliseconds)
    pub display_swap_ms: u32,
    /// Length of the beep that announces a scan (milliseconds)
    pub scan_beep_ms: u32,

    // --- Persistence ---
    /// Flash address of the little-endian red counter
    pub counter_addr: u32,
    /// Save the count when a scan is quit from the console, not just on abort
    pub persist_on_console_quit: bool,

    // --- Console ---
    /// Print raw `C= R= G= B=` values for every sample
    pub echo_samples: bool,

    // --- Classification ---
    pub classifier: ClassifierPolicy,

    // --- Sensor ---
    pub integration_time: IntegrationTime,
    pub gain: Gain,

    // --- Flash ---
    pub flash_timeouts: FlashTimeouts,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            sample_period_ms: 200, // 5 Hz
            blink_period_ms: 500,
            display_swap_ms: 500,
            scan_beep_ms: 400,

            // Persistence
            counter_addr: 0x00_0000, // first word of sector 0
            persist_on_console_quit: false,

            // Console
            echo_samples: true,

            // Classification
            classifier: ClassifierPolicy::default(),

            // Sensor
            integration_time: IntegrationTime::Ms24,
            gain: Gain::X1,

            // Flash
            flash_timeouts: FlashTimeouts::default(),
        }
    }
}

impl SystemConfig {
    /// Range-check every field against the attached flash part.
    pub fn validate(&self, geometry: &FlashGeometry) -> Result<(), ConfigError> {
        if self.sample_period_ms < self.integration_time.millis() {
            return Err(ConfigError::ValidationFailed(
                "sample_period_ms shorter than sensor integration time",
            ));
        }
        if self.blink_period_ms == 0 || self.display_swap_ms == 0 {
            return Err(ConfigError::ValidationFailed("blink/display periods must be non-zero"));
        }
        if self.counter_addr % 4 != 0 {
            return Err(ConfigError::ValidationFailed("counter_addr must be word aligned"));
        }
        if geometry.check_range(self.counter_addr, 4).is_err() {
            return Err(ConfigError::ValidationFailed("counter_addr outside flash"));
        }
        if self.classifier.min_clear() == 0 {
            return Err(ConfigError::ValidationFailed("classifier min_clear must be non-zero"));
        }
        let t = &self.flash_timeouts;
        // Zero means "wait forever" to the driver; never allowed from config.
        if t.sector_erase_ms == 0 || t.page_program_ms == 0 || t.init_ms == 0 || t.chip_erase_ms == 0
        {
            return Err(ConfigError::ValidationFailed("flash timeouts must be non-zero"));
        }
        Ok(())
    }
}
