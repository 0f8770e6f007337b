//! Anomaly alert output
//!
//! Alerts have no identity beyond their derived `id`. A recomputation with the
//! same inputs reproduces the same ids, so consumers can treat the output as a
//! stable set.

use crate::event::{DATE_FORMAT, Metric};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule produced an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    Drop,
    Spike,
    Outlier,
}

impl AnomalyKind {
    /// Rule evaluation order
    pub const ALL: [AnomalyKind; 3] = [AnomalyKind::Drop, AnomalyKind::Spike, AnomalyKind::Outlier];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::Spike => "spike",
            Self::Outlier => "outlier",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic alert identity: `{subject}-{metric}-{kind}-{YYYY-MM-DD}`.
///
/// `date` is the most recent day of the window. Deduplication compares these
/// strings, so every alert constructor must go through here.
pub fn alert_id(subject_id: &str, metric: Metric, kind: AnomalyKind, date: NaiveDate) -> String {
    format!(
        "{}-{}-{}-{}",
        subject_id,
        metric.as_str(),
        kind.as_str(),
        date.format(DATE_FORMAT)
    )
}

/// Nearest integer, halves toward positive infinity (`-49.5` becomes `-49`)
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    round_half_up(value * 100.0) / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyAlert {
    pub id: String,
    pub metric: Metric,
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub description: String,
    pub change_percent: i64,
    pub current_average: f64,
    pub previous_average: f64,
    pub window_days: usize,
    pub detected_at: DateTime<Utc>,
}

/// Sentence shown to the owner for an alert.
pub(crate) fn describe(
    metric: Metric,
    kind: AnomalyKind,
    change_percent: i64,
    previous_average: f64,
    current_average: f64,
    window_days: usize,
    latest_value: f64,
) -> String {
    let trend = format!(
        "{:.2} {unit}/day over the previous {days} days vs {:.2} {unit}/day over the last {days} days",
        previous_average,
        current_average,
        unit = metric.unit(),
        days = window_days,
    );
    match kind {
        AnomalyKind::Drop => format!(
            "{} dropped {}% ({})",
            metric.label(),
            change_percent.abs(),
            trend
        ),
        AnomalyKind::Spike => format!(
            "{} rose {}% ({})",
            metric.label(),
            change_percent,
            trend
        ),
        AnomalyKind::Outlier => format!(
            "{} reached {:.2} {} today, an unusually high single-day total (change {:+}%, {})",
            metric.label(),
            latest_value,
            metric.unit(),
            change_percent,
            trend
        ),
    }
}
