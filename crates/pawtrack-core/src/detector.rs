//! Anomaly Detector
//!
//! Pure function from "all events for one subject" to "current alert set for
//! that subject". Pipeline:
//! 1. Validation: drop malformed events (logged)
//! 2. Aggregation: dense daily totals over `2 * window_days` days ending today
//! 3. Rules: drop, spike and outlier, each across every metric, deduplicated
//!    by alert id
//!
//! "Now" is always an explicit argument; nothing here reads the wall clock.

use crate::aggregate::{DailyTotals, aggregate_daily};
use crate::alert::{AnomalyAlert, AnomalyKind, alert_id, describe, round2};
use crate::config::DetectorConfig;
use crate::event::{ActivityEvent, Metric};
use crate::rules::{evaluate_drop, evaluate_outlier, evaluate_spike};
use crate::validate::validate_events;
use crate::window::WindowSplit;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use tracing::debug;

/// Result of one detector run
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub alerts: Vec<AnomalyAlert>,
    /// The dense window the rules were evaluated over
    pub daily: Vec<DailyTotals>,
    pub detected_at: DateTime<Utc>,
}

/// Run the full pipeline for one subject.
///
/// "Today" is `now`'s calendar day in `now`'s own time zone; `detected_at`
/// is `now` converted to UTC. Events belonging to other subjects are expected
/// to have been filtered out by the caller.
pub fn detect<Tz: TimeZone>(
    subject_id: &str,
    events: &[ActivityEvent],
    config: &DetectorConfig,
    now: &DateTime<Tz>,
) -> Detection {
    let today = now.date_naive();
    let detected_at = now.with_timezone(&Utc);
    let window_days = config.window_days;

    let valid = validate_events(events);
    let daily = aggregate_daily(&valid, window_days, today);
    let split = WindowSplit::new(&daily, window_days);
    let anchor = split.latest().map(|d| d.date).unwrap_or(today);

    let mut alerts = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    // rule-major, then metric, for a stable output order
    for kind in AnomalyKind::ALL {
        for metric in Metric::ALL {
            let thresholds = config.thresholds(metric);
            let avg = split.averages(metric);
            let latest_value = split.latest().map(|d| d.get(metric)).unwrap_or(0.0);

            let hit = match kind {
                AnomalyKind::Drop => evaluate_drop(avg, thresholds, config),
                AnomalyKind::Spike => evaluate_spike(avg, thresholds, config),
                AnomalyKind::Outlier => evaluate_outlier(avg, latest_value, thresholds),
            };
            let Some(hit) = hit else {
                continue;
            };

            let id = alert_id(subject_id, metric, hit.kind, anchor);
            if !seen.insert(id.clone()) {
                continue;
            }

            alerts.push(AnomalyAlert {
                id,
                metric,
                kind: hit.kind,
                severity: hit.severity,
                description: describe(
                    metric,
                    hit.kind,
                    hit.change_percent,
                    avg.previous,
                    avg.current,
                    window_days,
                    latest_value,
                ),
                change_percent: hit.change_percent,
                current_average: round2(avg.current),
                previous_average: round2(avg.previous),
                window_days,
                detected_at,
            });
        }
    }

    debug!(
        subject = subject_id,
        events = events.len(),
        valid = valid.len(),
        alerts = alerts.len(),
        "Anomaly detection complete"
    );

    Detection {
        alerts,
        daily,
        detected_at,
    }
}

/// Alert list only; see [`detect`].
pub fn detect_anomalies<Tz: TimeZone>(
    subject_id: &str,
    events: &[ActivityEvent],
    config: &DetectorConfig,
    now: &DateTime<Tz>,
) -> Vec<AnomalyAlert> {
    detect(subject_id, events, config, now).alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Severity;
    use chrono::{Days, FixedOffset, NaiveDate};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 18, 30, 0).unwrap()
    }

    fn day(n_ago: u64) -> NaiveDate {
        now().date_naive().checked_sub_days(Days::new(n_ago)).unwrap()
    }

    #[test]
    fn test_empty_events() {
        let d = detect("cat", &[], &DetectorConfig::default(), &now());
        assert!(d.alerts.is_empty());
        assert_eq!(d.daily.len(), 14);
        assert_eq!(d.detected_at, now());
    }

    #[test]
    fn test_spike_and_outlier_coexist() {
        // 80 ml/day then 700 ml/day: spike and outlier have distinct ids
        let mut events = Vec::new();
        for n in 7..14 {
            events.push(ActivityEvent::on_day("cat", day(n)).with_water(80.0));
        }
        for n in 0..7 {
            events.push(ActivityEvent::on_day("cat", day(n)).with_water(700.0));
        }

        let alerts = detect_anomalies("cat", &events, &DetectorConfig::default(), &now());
        let kinds: Vec<_> = alerts.iter().map(|a| (a.metric, a.kind)).collect();
        assert_eq!(
            kinds,
            vec![(Metric::Water, AnomalyKind::Spike), (Metric::Water, AnomalyKind::Outlier)]
        );
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[1].severity, Severity::Warning);
        assert_eq!(alerts[1].change_percent, alerts[0].change_percent);
        assert_ne!(alerts[0].id, alerts[1].id);
    }

    #[test]
    fn test_alerts_are_ordered_by_rule_then_metric() {
        let mut events = Vec::new();
        for n in 7..14 {
            events.push(ActivityEvent::on_day("cat", day(n)).with_water(100.0));
        }
        for n in 0..7 {
            events.push(ActivityEvent::on_day("cat", day(n)).with_water(10.0));
        }
        events.push(ActivityEvent::on_day("cat", day(0)).with_food(700.0));

        let alerts = detect_anomalies("cat", &events, &DetectorConfig::default(), &now());
        let kinds: Vec<_> = alerts.iter().map(|a| (a.metric, a.kind)).collect();
        assert_eq!(
            kinds,
            vec![(Metric::Water, AnomalyKind::Drop), (Metric::Food, AnomalyKind::Outlier)]
        );
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[1].severity, Severity::Warning);
    }

    #[test]
    fn test_today_follows_time_zone_of_now() {
        // 18:30 UTC on the 16th is already the 17th at UTC+8
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let local_now = now().with_timezone(&offset);
        let d = detect("cat", &[], &DetectorConfig::default(), &local_now);
        assert_eq!(d.daily.last().unwrap().date, NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
        assert_eq!(d.detected_at, now());
    }

    #[test]
    fn test_alert_ids_anchor_on_latest_day() {
        let events = vec![ActivityEvent::on_day("rex", day(0)).with_litter(9.0)];
        let alerts = detect_anomalies("rex", &events, &DetectorConfig::default(), &now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "rex-litter-outlier-2026-10-16");
    }

    #[test]
    fn test_malformed_events_are_skipped() {
        let mut bad = ActivityEvent::on_day("cat", day(0)).with_food(5000.0);
        bad.date = "yesterday".into();
        let alerts = detect_anomalies("cat", &[bad], &DetectorConfig::default(), &now());
        assert!(alerts.is_empty());
    }
}
