//! Window Splitter & Averager
//!
//! Splits the dense day sequence into the older "previous" half and the newer
//! "current" half and averages each metric per half.

use crate::aggregate::DailyTotals;
use crate::event::Metric;

/// The two half-window means for one metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfWindowAverages {
    pub previous: f64,
    pub current: f64,
}

/// Mean of `metric` over a half-window.
///
/// Divides by `window_days`, not by the number of non-empty days.
pub fn average_metric(half: &[DailyTotals], metric: Metric, window_days: usize) -> f64 {
    if window_days == 0 {
        return 0.0;
    }
    let sum: f64 = half.iter().map(|d| d.get(metric)).sum();
    sum / window_days as f64
}

#[derive(Debug, Clone, Copy)]
pub struct WindowSplit<'a> {
    previous: &'a [DailyTotals],
    current: &'a [DailyTotals],
    window_days: usize,
}

impl<'a> WindowSplit<'a> {
    pub fn new(days: &'a [DailyTotals], window_days: usize) -> Self {
        let current_start = days.len().saturating_sub(window_days);
        let previous_start = current_start.saturating_sub(window_days);
        Self {
            previous: &days[previous_start..current_start],
            current: &days[current_start..],
            window_days,
        }
    }

    pub fn previous(&self) -> &'a [DailyTotals] {
        self.previous
    }

    pub fn current(&self) -> &'a [DailyTotals] {
        self.current
    }

    pub fn averages(&self, metric: Metric) -> HalfWindowAverages {
        HalfWindowAverages {
            previous: average_metric(self.previous, metric, self.window_days),
            current: average_metric(self.current, metric, self.window_days),
        }
    }

    /// The most recent day's raw totals
    pub fn latest(&self) -> Option<&'a DailyTotals> {
        self.current.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_daily;
    use chrono::NaiveDate;

    fn window_with_food(values: &[f64]) -> Vec<DailyTotals> {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mut days = aggregate_daily(&[], values.len() / 2, today);
        for (day, v) in days.iter_mut().zip(values) {
            day.food = *v;
        }
        days
    }

    #[test]
    fn test_split_halves() {
        let days = window_with_food(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let split = WindowSplit::new(&days, 3);
        assert_eq!(split.previous().len(), 3);
        assert_eq!(split.current().len(), 3);
        assert_eq!(split.previous()[0].food, 1.0);
        assert_eq!(split.current()[0].food, 4.0);
        assert_eq!(split.latest().map(|d| d.food), Some(6.0));
    }

    #[test]
    fn test_averages_divide_by_window_days() {
        let days = window_with_food(&[0.0, 0.0, 30.0, 10.0, 20.0, 30.0]);
        let avg = WindowSplit::new(&days, 3).averages(Metric::Food);
        assert_eq!(avg.previous, 10.0);
        assert_eq!(avg.current, 20.0);
    }

    #[test]
    fn test_empty_sequence() {
        let split = WindowSplit::new(&[], 7);
        assert!(split.latest().is_none());
        let avg = split.averages(Metric::Water);
        assert_eq!(avg.previous, 0.0);
        assert_eq!(avg.current, 0.0);
    }
}
