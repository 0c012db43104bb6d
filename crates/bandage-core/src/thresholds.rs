//! Temperature and humidity status bands.
//!
//! This module maps the latest reading of each metric to a qualitative
//! severity band. Boundaries are closed on the upper side: a value equal to
//! a threshold belongs to the lower band. There is no hysteresis.
//!
//! # Example
//!
//! ```
//! use bandage_core::{StatusBand, Thresholds};
//!
//! let thresholds = Thresholds::default();
//! assert_eq!(thresholds.evaluate_temperature(36.5), StatusBand::Normal);
//! assert_eq!(thresholds.evaluate_temperature(35.0), StatusBand::WarningLow);
//! assert_eq!(thresholds.evaluate_humidity(95.0), StatusBand::WarningHigh);
//! ```

use serde::{Deserialize, Serialize};

use bandage_types::{Metric, Reading};

/// Severity band for a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBand {
    /// Far below the normal range.
    CriticalLow,
    /// Slightly below the normal range.
    WarningLow,
    /// Within the normal range.
    Normal,
    /// Above the normal range.
    WarningHigh,
    /// Far above the normal range.
    CriticalHigh,
}

impl StatusBand {
    /// Whether the band needs attention.
    pub fn is_alert(&self) -> bool {
        !matches!(self, StatusBand::Normal)
    }

    /// Whether the band is one of the critical extremes.
    pub fn is_critical(&self) -> bool {
        matches!(self, StatusBand::CriticalLow | StatusBand::CriticalHigh)
    }
}

impl std::fmt::Display for StatusBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusBand::CriticalLow => "critical-low",
            StatusBand::WarningLow => "warning-low",
            StatusBand::Normal => "normal",
            StatusBand::WarningHigh => "warning-high",
            StatusBand::CriticalHigh => "critical-high",
        };
        f.write_str(s)
    }
}

/// Threshold table for both metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Upper bound (inclusive) of the critical-low temperature band.
    pub temperature_critical_low_max: f64,
    /// Upper bound (inclusive) of the warning-low temperature band.
    pub temperature_warning_low_max: f64,
    /// Upper bound (inclusive) of the normal temperature band.
    pub temperature_normal_max: f64,
    // Above temperature_normal_max is CriticalHigh
    /// Lower bound (inclusive) of the normal humidity band.
    pub humidity_normal_min: f64,
    /// Upper bound (inclusive) of the normal humidity band.
    pub humidity_normal_max: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            temperature_critical_low_max: 32.0,
            temperature_warning_low_max: 35.0,
            temperature_normal_max: 38.0,
            humidity_normal_min: 70.0,
            humidity_normal_max: 90.0,
        }
    }
}

/// Threshold evaluator for sensor readings.
#[derive(Debug, Clone, Default)]
pub struct Thresholds {
    config: ThresholdConfig,
}

impl Thresholds {
    /// Create a new threshold evaluator with the given configuration.
    pub fn new(config: ThresholdConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// Band for a temperature in degrees Celsius.
    pub fn evaluate_temperature(&self, t: f64) -> StatusBand {
        if t <= self.config.temperature_critical_low_max {
            StatusBand::CriticalLow
        } else if t <= self.config.temperature_warning_low_max {
            StatusBand::WarningLow
        } else if t <= self.config.temperature_normal_max {
            StatusBand::Normal
        } else {
            StatusBand::CriticalHigh
        }
    }

    /// Band for a relative humidity in percent.
    pub fn evaluate_humidity(&self, h: f64) -> StatusBand {
        if h < self.config.humidity_normal_min {
            StatusBand::WarningLow
        } else if h <= self.config.humidity_normal_max {
            StatusBand::Normal
        } else {
            StatusBand::WarningHigh
        }
    }

    /// Band for a reading of either metric.
    pub fn evaluate(&self, reading: &Reading) -> StatusBand {
        match reading.metric() {
            Metric::Temperature => self.evaluate_temperature(reading.value()),
            Metric::Humidity => self.evaluate_humidity(reading.value()),
        }
    }
}
