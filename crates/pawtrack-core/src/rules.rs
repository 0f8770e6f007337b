//! Anomaly Rule Engine
//!
//! Three independent rules per metric:
//! - Drop: sustained week-over-week decline (needs a non-zero previous average)
//! - Spike: sustained week-over-week increase (needs a non-zero previous average)
//! - Outlier: latest day at or above an absolute threshold (needs no history)

use crate::alert::{AnomalyKind, Severity, round_half_up};
use crate::config::{DetectorConfig, MetricThresholds};
use crate::window::HalfWindowAverages;

/// A rule that fired, before it is shaped into an alert
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleHit {
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub change_percent: i64,
}

/// Signed whole-number percent change from `previous` to `current`.
///
/// Zero when `previous` is not positive. Halves round up, so `-49.5` is `-49`.
pub fn change_percent(previous: f64, current: f64) -> i64 {
    if previous <= 0.0 {
        return 0;
    }
    round_half_up((current - previous) / previous * 100.0) as i64
}

/// Rule A
pub fn evaluate_drop(
    avg: HalfWindowAverages,
    thresholds: &MetricThresholds,
    config: &DetectorConfig,
) -> Option<RuleHit> {
    if avg.previous <= 0.0 || avg.current >= avg.previous {
        return None;
    }

    let drop_ratio = (avg.previous - avg.current) / avg.previous;
    if drop_ratio < thresholds.drop_ratio {
        return None;
    }

    let change = change_percent(avg.previous, avg.current);
    let severity = if change.abs() >= config.drop_critical_percent {
        Severity::Critical
    } else {
        Severity::Warning
    };

    Some(RuleHit {
        kind: AnomalyKind::Drop,
        severity,
        change_percent: change,
    })
}

/// Rule B
pub fn evaluate_spike(
    avg: HalfWindowAverages,
    thresholds: &MetricThresholds,
    config: &DetectorConfig,
) -> Option<RuleHit> {
    if avg.previous <= 0.0 || avg.current <= avg.previous {
        return None;
    }
    if avg.current < avg.previous * thresholds.spike_multiplier {
        return None;
    }

    let change = change_percent(avg.previous, avg.current);
    let severity = if change >= config.spike_critical_percent {
        Severity::Critical
    } else {
        Severity::Warning
    };

    Some(RuleHit {
        kind: AnomalyKind::Spike,
        severity,
        change_percent: change,
    })
}

/// Rule C. Only metrics with a `critical_outlier_multiplier` can go critical.
pub fn evaluate_outlier(
    avg: HalfWindowAverages,
    latest_value: f64,
    thresholds: &MetricThresholds,
) -> Option<RuleHit> {
    if latest_value < thresholds.outlier_threshold {
        return None;
    }

    let severity = match thresholds.critical_outlier_multiplier {
        Some(m) if latest_value >= thresholds.outlier_threshold * m => Severity::Critical,
        _ => Severity::Warning,
    };

    Some(RuleHit {
        kind: AnomalyKind::Outlier,
        severity,
        change_percent: change_percent(avg.previous, avg.current),
    })
}
