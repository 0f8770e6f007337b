//! Detector configuration
//!
//! Defaults reproduce the production rule table. A partial JSON document may
//! override any field; missing fields keep their defaults.

use crate::error::ConfigError;
use crate::event::Metric;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest accepted half-window, one year
pub const MAX_WINDOW_DAYS: usize = 366;

/// Per-metric rule thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricThresholds {
    /// Minimum fractional decrease of the current half-window average
    pub drop_ratio: f64,
    /// Current average must reach `previous * spike_multiplier`
    pub spike_multiplier: f64,
    /// Latest-day total that triggers an outlier regardless of history
    pub outlier_threshold: f64,
    /// Latest-day multiple of `outlier_threshold` that makes an outlier critical
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_outlier_multiplier: Option<f64>,
}

impl MetricThresholds {
    pub fn food() -> Self {
        Self {
            drop_ratio: 0.30,
            spike_multiplier: 1.6,
            outlier_threshold: 600.0,
            critical_outlier_multiplier: Some(1.5),
        }
    }

    pub fn water() -> Self {
        Self {
            drop_ratio: 0.40,
            spike_multiplier: 1.8,
            outlier_threshold: 600.0,
            critical_outlier_multiplier: None,
        }
    }

    pub fn litter() -> Self {
        Self {
            drop_ratio: 0.40,
            spike_multiplier: 1.8,
            outlier_threshold: 8.0,
            critical_outlier_multiplier: None,
        }
    }

    fn validate(&self, metric: Metric) -> Result<(), ConfigError> {
        if !(self.drop_ratio > 0.0 && self.drop_ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "{}: dropRatio must be in (0, 1], got {}",
                metric, self.drop_ratio
            )));
        }
        if !(self.spike_multiplier > 1.0 && self.spike_multiplier.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "{}: spikeMultiplier must be > 1, got {}",
                metric, self.spike_multiplier
            )));
        }
        if !(self.outlier_threshold > 0.0 && self.outlier_threshold.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "{}: outlierThreshold must be positive, got {}",
                metric, self.outlier_threshold
            )));
        }
        if let Some(m) = self.critical_outlier_multiplier {
            if !(m >= 1.0 && m.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "{}: criticalOutlierMultiplier must be >= 1, got {}",
                    metric, m
                )));
            }
        }
        Ok(())
    }
}

/// Full rule-engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorConfig {
    /// Length of each half-window in days; the window spans twice this
    pub window_days: usize,
    pub food: MetricThresholds,
    pub water: MetricThresholds,
    pub litter: MetricThresholds,
    /// A drop whose |changePercent| reaches this is critical
    pub drop_critical_percent: i64,
    /// A spike whose changePercent reaches this is critical
    pub spike_critical_percent: i64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            food: MetricThresholds::food(),
            water: MetricThresholds::water(),
            litter: MetricThresholds::litter(),
            drop_critical_percent: 50,
            spike_critical_percent: 100,
        }
    }
}

impl DetectorConfig {
    pub fn thresholds(&self, metric: Metric) -> &MetricThresholds {
        match metric {
            Metric::Food => &self.food,
            Metric::Water => &self.water,
            Metric::Litter => &self.litter,
        }
    }

    /// Total number of days covered by both half-windows
    pub fn span_days(&self) -> usize {
        self.window_days.saturating_mul(2)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_days == 0 {
            return Err(ConfigError::Invalid("windowDays must be at least 1".into()));
        }
        if self.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::Invalid(format!(
                "windowDays must be at most {}, got {}",
                MAX_WINDOW_DAYS, self.window_days
            )));
        }
        for metric in Metric::ALL {
            self.thresholds(metric).validate(metric)?;
        }
        if self.drop_critical_percent <= 0 || self.spike_critical_percent <= 0 {
            return Err(ConfigError::Invalid(
                "critical percent cut-offs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json_str(&raw)
    }
}
