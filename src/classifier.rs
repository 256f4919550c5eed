//! Red / not-red decision on a raw colour sample.
//!
//! Two policies share one interface:
//!
//! | Policy   | Dark reject     | Red when                                   |
//! |----------|-----------------|--------------------------------------------|
//! | `Ratio`  | `clear < 60`    | `r8 >= 200 && g8 <= 50 && b8 <= 50`        |
//! | `Margin` | `clear < 50`    | `red > green + 40 && red > blue + 40`      |
//!
//! `r8/g8/b8` are the channels scaled against clear into 0..=255 by
//! [`normalize`].

use serde::{Deserialize, Serialize};

use crate::sensors::SensorSample;

/// Colour channels scaled to 0..=255 relative to the clear channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// `round(min(ch, clear) * 255 / clear)`, clamped to 255.
fn scale(channel: u16, clear: u16) -> u8 {
    if clear == 0 {
        return 0;
    }
    let c = u32::from(clear);
    let ch = u32::from(channel.min(clear));
    ((ch * 255 + c / 2) / c).min(255) as u8
}

/// Scale each colour channel against clear.  A zero clear reading maps to
/// black.
pub fn normalize(sample: &SensorSample) -> Rgb8 {
    Rgb8 {
        r: scale(sample.red, sample.clear),
        g: scale(sample.green, sample.clear),
        b: scale(sample.blue, sample.clear),
    }
}

pub trait RedClassifier {
    fn is_red(&self, sample: &SensorSample) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Ratio policy
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioClassifier {
    pub min_clear: u16,
    pub red_min: u8,
    pub green_max: u8,
    pub blue_max: u8,
}

impl Default for RatioClassifier {
    fn default() -> Self {
        Self {
            min_clear: 60,
            red_min: 200,
            green_max: 50,
            blue_max: 50,
        }
    }
}

impl RedClassifier for RatioClassifier {
    fn is_red(&self, sample: &SensorSample) -> bool {
        if sample.clear < self.min_clear {
            return false;
        }
        let rgb = normalize(sample);
        rgb.r >= self.red_min && rgb.g <= self.green_max && rgb.b <= self.blue_max
    }
}

// ───────────────────────────────────────────────────────────────
// Margin policy
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginClassifier {
    pub min_clear: u16,
    pub margin: u16,
}

impl Default for MarginClassifier {
    fn default() -> Self {
        Self {
            min_clear: 50,
            margin: 40,
        }
    }
}

impl RedClassifier for MarginClassifier {
    fn is_red(&self, sample: &SensorSample) -> bool {
        if sample.clear < self.min_clear {
            return false;
        }
        let red = u32::from(sample.red);
        let margin = u32::from(self.margin);
        red > u32::from(sample.green) + margin && red > u32::from(sample.blue) + margin
    }
}

// ───────────────────────────────────────────────────────────────
// Selectable policy
// ───────────────────────────────────────────────────────────────

/// The classifier used by the scan loop, chosen in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifierPolicy {
    Ratio(RatioClassifier),
    Margin(MarginClassifier),
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self::Ratio(RatioClassifier::default())
    }
}

impl ClassifierPolicy {
    /// Dark-reject threshold of the active policy.
    pub const fn min_clear(&self) -> u16 {
        match self {
            Self::Ratio(c) => c.min_clear,
            Self::Margin(c) => c.min_clear,
        }
    }
}

impl RedClassifier for ClassifierPolicy {
    fn is_red(&self, sample: &SensorSample) -> bool {
        match self {
            Self::Ratio(c) => c.is_red(sample),
            Self::Margin(c) => c.is_red(sample),
        }
    }
}
