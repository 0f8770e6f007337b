use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeZone, Utc};
use pawtrack_core::{
    ActivityEvent, AnomalyKind, AnomalyService, DetectorConfig, FixedClock, Metric, Severity,
    detect, detect_anomalies,
};

const SUBJECT: &str = "luna";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 20, 0, 0).unwrap()
}

fn day(n_ago: u64) -> NaiveDate {
    now().date_naive().checked_sub_days(Days::new(n_ago)).unwrap()
}

/// One event per day: `previous` for days 13..=7 ago, `current` for 6..=0 ago.
fn two_weeks(previous: f64, current: f64, build: fn(ActivityEvent, f64) -> ActivityEvent) -> Vec<ActivityEvent> {
    (0..14)
        .map(|n| {
            let value = if n >= 7 { previous } else { current };
            build(ActivityEvent::on_day(SUBJECT, day(n)), value)
        })
        .collect()
}

fn run(events: &[ActivityEvent]) -> Vec<pawtrack_core::AnomalyAlert> {
    detect_anomalies(SUBJECT, events, &DetectorConfig::default(), &now())
}

#[test]
fn test_recompute_is_deterministic() {
    let mut events = two_weeks(50.0, 20.0, ActivityEvent::with_food);
    events.extend(two_weeks(2.0, 6.0, ActivityEvent::with_litter));
    events.push(ActivityEvent::on_day(SUBJECT, day(0)).with_water(650.0));

    let first = run(&events);
    let second = run(&events);
    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    // Input order does not matter
    events.reverse();
    assert_eq!(run(&events), first);
}

#[test]
fn test_no_events_no_alerts() {
    assert!(run(&[]).is_empty());

    let mut service = AnomalyService::in_memory(DetectorConfig::default())
        .with_clock(FixedClock(now().fixed_offset()));
    assert!(service.get_anomalies(SUBJECT).is_empty());
    assert!(service.recalc_anomalies(SUBJECT).is_empty());
    assert!(service.get_anomalies(SUBJECT).is_empty());
}

#[test]
fn test_stable_trend_no_alert() {
    let events = two_weeks(50.0, 50.0, ActivityEvent::with_food);
    assert!(run(&events).iter().all(|a| a.metric != Metric::Food));
    assert!(run(&events).is_empty());
}

#[test]
fn test_food_drop_is_critical() {
    let events = two_weeks(50.0, 20.0, ActivityEvent::with_food);
    let alerts = run(&events);

    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.metric, Metric::Food);
    assert_eq!(alert.kind, AnomalyKind::Drop);
    assert_eq!(alert.severity, Severity::Critical);
    assert_eq!(alert.change_percent, -60);
    assert_eq!(alert.previous_average, 50.0);
    assert_eq!(alert.current_average, 20.0);
    assert_eq!(alert.window_days, 7);
    assert_eq!(alert.detected_at, now());
    assert_eq!(alert.id, "luna-food-drop-2026-10-16");
}

#[test]
fn test_litter_spike_is_critical() {
    let events = two_weeks(2.0, 6.0, ActivityEvent::with_litter);
    let alerts = run(&events);

    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.metric, Metric::Litter);
    assert_eq!(alert.kind, AnomalyKind::Spike);
    assert_eq!(alert.severity, Severity::Critical);
    assert_eq!(alert.change_percent, 200);
}

#[test]
fn test_water_outlier_without_history() {
    let events = vec![ActivityEvent::on_day(SUBJECT, day(0)).with_water(650.0)];
    let alerts = run(&events);

    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.metric, Metric::Water);
    assert_eq!(alert.kind, AnomalyKind::Outlier);
    assert_eq!(alert.severity, Severity::Warning);
    assert_eq!(alert.change_percent, 0);
    assert_eq!(alert.previous_average, 0.0);
    assert_eq!(alert.current_average, 92.86);
}

#[test]
fn test_food_outlier_goes_critical() {
    let events = vec![ActivityEvent::on_day(SUBJECT, day(0)).with_dry_food(900.0)];
    let alerts = run(&events);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AnomalyKind::Outlier);
    assert_eq!(alerts[0].severity, Severity::Critical);
}

#[test]
fn test_zero_previous_average_blocks_trend_rules() {
    // Nothing last week, plenty this week, but no single day over threshold
    let events: Vec<_> = (0..7)
        .map(|n| ActivityEvent::on_day(SUBJECT, day(n)).with_food(300.0).with_litter(5.0))
        .collect();
    assert!(run(&events).is_empty());
}

#[test]
fn test_window_boundary() {
    let outside = vec![ActivityEvent::on_day(SUBJECT, day(14)).with_food(50.0)];
    let detection = detect(SUBJECT, &outside, &DetectorConfig::default(), &now());
    assert!(detection.daily.iter().all(|d| d.food == 0.0));

    let inside = vec![ActivityEvent::on_day(SUBJECT, day(13)).with_food(50.0)];
    let detection = detect(SUBJECT, &inside, &DetectorConfig::default(), &now());
    assert_eq!(detection.daily.len(), 14);
    assert_eq!(detection.daily[0].date, day(13));
    assert_eq!(detection.daily[0].food, 50.0);

    // and with history on the boundary day a full drop follows
    let alerts = detect_anomalies(SUBJECT, &inside, &DetectorConfig::default(), &now());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AnomalyKind::Drop);
    assert_eq!(alerts[0].change_percent, -100);
}

#[test]
fn test_wet_food_feeds_both_signals() {
    // 40 g wet food/day = 30 ml water-equivalent; both collapse to zero
    let events = two_weeks(40.0, 0.0, ActivityEvent::with_wet_food);
    let alerts = run(&events);

    let metrics: Vec<_> = alerts.iter().map(|a| (a.metric, a.kind)).collect();
    assert_eq!(
        metrics,
        vec![(Metric::Food, AnomalyKind::Drop), (Metric::Water, AnomalyKind::Drop)]
    );
    assert_eq!(alerts[1].previous_average, 30.0);
}

#[test]
fn test_stopped_logging_looks_like_drop() {
    // No data is indistinguishable from zero activity
    let events: Vec<_> = (7..14)
        .map(|n| ActivityEvent::on_day(SUBJECT, day(n)).with_food(60.0))
        .collect();
    let alerts = run(&events);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AnomalyKind::Drop);
    assert_eq!(alerts[0].severity, Severity::Critical);
}

#[test]
fn test_local_day_anchoring() {
    // 20:00 UTC is already tomorrow at UTC+9; today's event lands in the
    // second-to-last bucket there
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    let events = vec![ActivityEvent::on_day(SUBJECT, day(0)).with_water(650.0)];
    let alerts = detect_anomalies(
        SUBJECT,
        &events,
        &DetectorConfig::default(),
        &now().with_timezone(&tokyo),
    );
    assert!(alerts.is_empty());
}
