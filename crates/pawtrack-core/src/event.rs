//! Activity Events
//!
//! The input side of the detector: one record per logged meal, drink or
//! litter-box visit. Events are owned by the event store and read-only here.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Water-equivalent units contributed per unit of wet food mass.
pub const WET_FOOD_HYDRATION_RATIO: f64 = 0.75;

/// Calendar day format used by the `date` field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The three aggregated health signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Food,
    Water,
    Litter,
}

impl Metric {
    /// Evaluation order used by the rule engine.
    pub const ALL: [Metric; 3] = [Metric::Food, Metric::Water, Metric::Litter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Water => "water",
            Self::Litter => "litter",
        }
    }

    /// Human-readable name used in alert descriptions
    pub fn label(&self) -> &'static str {
        match self {
            Self::Food => "Food intake",
            Self::Water => "Water intake",
            Self::Litter => "Litter box use",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Food => "g",
            Self::Water => "ml",
            Self::Litter => "visits",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store-assigned identity of an event, used for edits and removals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single journal entry for one subject.
///
/// `date` is the producer's local calendar day for `occurred_at`. The detector
/// buckets by `date` as given and never re-derives it from the instant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    #[serde(default)]
    pub subject_id: String,
    pub occurred_at: DateTime<Utc>,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wet_food_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_food_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snack_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub litter_count: Option<f64>,
}

impl ActivityEvent {
    pub fn new(subject_id: impl Into<String>, occurred_at: DateTime<Utc>, date: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            occurred_at,
            date: date.into(),
            ..Default::default()
        }
    }

    /// Event stamped at noon UTC of `day`, with a matching `date` string.
    pub fn on_day(subject_id: impl Into<String>, day: NaiveDate) -> Self {
        let occurred_at = day.and_time(NaiveTime::MIN).and_utc() + chrono::TimeDelta::hours(12);
        Self::new(subject_id, occurred_at, day.format(DATE_FORMAT).to_string())
    }

    pub fn with_food(mut self, amount: f64) -> Self {
        self.food_amount = Some(amount);
        self
    }

    pub fn with_wet_food(mut self, amount: f64) -> Self {
        self.wet_food_amount = Some(amount);
        self
    }

    pub fn with_dry_food(mut self, amount: f64) -> Self {
        self.dry_food_amount = Some(amount);
        self
    }

    pub fn with_snack(mut self, amount: f64) -> Self {
        self.snack_amount = Some(amount);
        self
    }

    pub fn with_water(mut self, amount: f64) -> Self {
        self.water_amount = Some(amount);
        self
    }

    pub fn with_litter(mut self, count: f64) -> Self {
        self.litter_count = Some(count);
        self
    }

    /// Mass of everything eaten: main food, wet, dry and snacks.
    pub fn food(&self) -> f64 {
        [
            self.food_amount,
            self.wet_food_amount,
            self.dry_food_amount,
            self.snack_amount,
        ]
        .iter()
        .map(|v| v.unwrap_or(0.0))
        .sum()
    }

    /// Drunk water plus the moisture carried by wet food.
    pub fn water(&self) -> f64 {
        self.water_amount.unwrap_or(0.0)
            + self.wet_food_amount.unwrap_or(0.0) * WET_FOOD_HYDRATION_RATIO
    }

    pub fn litter(&self) -> f64 {
        self.litter_count.unwrap_or(0.0)
    }

    pub fn contribution(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Food => self.food(),
            Metric::Water => self.water(),
            Metric::Litter => self.litter(),
        }
    }

    /// All raw amount fields that are present, with their names.
    pub fn raw_amounts(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        [
            ("foodAmount", self.food_amount),
            ("wetFoodAmount", self.wet_food_amount),
            ("dryFoodAmount", self.dry_food_amount),
            ("snackAmount", self.snack_amount),
            ("waterAmount", self.water_amount),
            ("litterCount", self.litter_count),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.map(|v| (name, v)))
    }
}
