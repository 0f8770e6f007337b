//! Activity Journal Generator
//!
//! Turns a scenario's daily targets into individual, noisy journal entries
//! with the same shape a real owner would log.

use chrono::{Days, NaiveDate, NaiveTime, TimeDelta};
use pawtrack_core::ActivityEvent;
use pawtrack_core::event::WET_FOOD_HYDRATION_RATIO;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::scenarios::{DayProfile, Scenario};

/// Share of the daily food target eaten as wet food; the rest is dry
const WET_SHARE: f64 = 0.5;
const MEAL_HOURS: [i64; 2] = [8, 18];
const DRINK_HOURS: [i64; 3] = [10, 14, 21];

pub struct JournalGenerator {
    rng: StdRng,
    /// Relative standard deviation applied to each amount
    noise: f64,
}

impl JournalGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            noise: 0.1,
        }
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise.max(0.0);
        self
    }

    /// Events for `subject_id` covering the `2 * window_days` days up to `today`
    pub fn generate(
        &mut self,
        subject_id: &str,
        scenario: Scenario,
        today: NaiveDate,
        window_days: u64,
    ) -> Vec<ActivityEvent> {
        let mut events = Vec::new();

        for days_ago in (0..window_days * 2).rev() {
            let Some(day) = today.checked_sub_days(Days::new(days_ago)) else {
                continue;
            };
            let profile = scenario.day_profile(days_ago, window_days);
            if profile.logged {
                self.day_events(subject_id, day, profile, &mut events);
            }
        }

        events
    }

    fn day_events(
        &mut self,
        subject_id: &str,
        day: NaiveDate,
        profile: DayProfile,
        out: &mut Vec<ActivityEvent>,
    ) {
        let meal_food = profile.food / MEAL_HOURS.len() as f64;
        for hour in MEAL_HOURS {
            let wet = self.jitter(meal_food * WET_SHARE);
            let dry = self.jitter(meal_food * (1.0 - WET_SHARE));
            out.push(
                self.event_at(subject_id, day, hour)
                    .with_wet_food(wet)
                    .with_dry_food(dry),
            );
        }

        // wet food already covers part of the water target
        let wet_water = profile.food * WET_SHARE * WET_FOOD_HYDRATION_RATIO;
        let drink = (profile.water - wet_water).max(0.0) / DRINK_HOURS.len() as f64;
        for hour in DRINK_HOURS {
            let amount = self.jitter(drink);
            out.push(self.event_at(subject_id, day, hour).with_water(amount));
        }

        let visits = self.jitter(profile.litter).round() as i64;
        for _ in 0..visits {
            let hour = self.rng.random_range(0..24);
            out.push(self.event_at(subject_id, day, hour).with_litter(1.0));
        }
    }

    fn event_at(&self, subject_id: &str, day: NaiveDate, hour: i64) -> ActivityEvent {
        let mut event = ActivityEvent::on_day(subject_id, day);
        event.occurred_at = day.and_time(NaiveTime::MIN).and_utc() + TimeDelta::hours(hour);
        event
    }

    /// Multiplicative noise, never negative
    fn jitter(&mut self, value: f64) -> f64 {
        if self.noise == 0.0 || value == 0.0 {
            return value;
        }
        let factor = match Normal::new(1.0, self.noise) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => 1.0,
        };
        (value * factor).max(0.0)
    }
}
