//! Daily Aggregator
//!
//! Buckets a subject's events into a dense, oldest-first run of calendar days
//! ending at "today". Days without events are present with zero totals, so the
//! output always has exactly `2 * window_days` entries.

use crate::event::Metric;
use crate::validate::ValidatedEvent;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Summed signals for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub food: f64,
    pub water: f64,
    pub litter: f64,
}

impl DailyTotals {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            food: 0.0,
            water: 0.0,
            litter: 0.0,
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Food => self.food,
            Metric::Water => self.water,
            Metric::Litter => self.litter,
        }
    }

    fn absorb(&mut self, event: &ValidatedEvent<'_>) {
        self.food += event.event.food();
        self.water += event.event.water();
        self.litter += event.event.litter();
    }
}

/// First day of the window: `today - (2 * window_days - 1)`.
///
/// An event dated exactly `2 * window_days` days before today falls outside.
pub fn window_start(today: NaiveDate, window_days: usize) -> NaiveDate {
    let back = window_days.saturating_mul(2).saturating_sub(1) as u64;
    today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN)
}

/// Build the dense day sequence for the window ending at `today`.
pub fn aggregate_daily(
    events: &[ValidatedEvent<'_>],
    window_days: usize,
    today: NaiveDate,
) -> Vec<DailyTotals> {
    let span = window_days.saturating_mul(2);
    let start = window_start(today, window_days);

    let mut days: Vec<DailyTotals> = start
        .iter_days()
        .take(span)
        .map(DailyTotals::empty)
        .collect();

    for event in events {
        let offset = event.day.signed_duration_since(start).num_days();
        if offset < 0 {
            continue;
        }
        if let Some(bucket) = days.get_mut(offset as usize) {
            bucket.absorb(event);
        }
    }

    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ActivityEvent;
    use crate::validate::validate_events;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn days_ago(n: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(n)).unwrap()
    }

    #[test]
    fn test_dense_window_without_events() {
        let days = aggregate_daily(&[], 7, today());
        assert_eq!(days.len(), 14);
        assert_eq!(days[0].date, days_ago(13));
        assert_eq!(days[13].date, today());
        for pair in days.windows(2) {
            assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }
        assert!(days.iter().all(|d| d.food == 0.0 && d.water == 0.0 && d.litter == 0.0));
    }

    #[test]
    fn test_sums_events_per_day() {
        let events = vec![
            ActivityEvent::on_day("cat", today()).with_food(30.0).with_water(50.0),
            ActivityEvent::on_day("cat", today()).with_wet_food(40.0).with_litter(2.0),
            ActivityEvent::on_day("cat", days_ago(3)).with_litter(1.0),
        ];
        let valid = validate_events(&events);
        let days = aggregate_daily(&valid, 7, today());

        let last = days[13];
        assert_eq!(last.food, 70.0);
        assert_eq!(last.water, 80.0);
        assert_eq!(last.litter, 2.0);
        assert_eq!(days[10].litter, 1.0);
    }

    #[test]
    fn test_ignores_events_outside_window() {
        let events = vec![
            ActivityEvent::on_day("cat", days_ago(14)).with_food(100.0),
            ActivityEvent::on_day("cat", days_ago(13)).with_food(10.0),
            ActivityEvent::on_day("cat", today().succ_opt().unwrap()).with_food(100.0),
        ];
        let valid = validate_events(&events);
        let days = aggregate_daily(&valid, 7, today());

        let total: f64 = days.iter().map(|d| d.food).sum();
        assert_eq!(total, 10.0);
        assert_eq!(days[0].food, 10.0);
    }

    #[test]
    fn test_window_start() {
        assert_eq!(window_start(today(), 7), days_ago(13));
        assert_eq!(window_start(today(), 1), days_ago(1));
    }
}
