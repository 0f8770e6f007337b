//! Pre-aggregation validation pass.
//!
//! Events with an unparsable `date` or a negative / non-finite amount are
//! dropped before aggregation and each drop is logged. Nothing is ever
//! silently averaged in.

use crate::event::{ActivityEvent, DATE_FORMAT};
use chrono::NaiveDate;
use std::fmt;
use tracing::warn;

/// Why an event was excluded from aggregation
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    UnparsableDate(String),
    NegativeAmount { field: &'static str, value: f64 },
    NonFiniteAmount { field: &'static str },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparsableDate(d) => write!(f, "unparsable date '{}'", d),
            Self::NegativeAmount { field, value } => write!(f, "negative {}: {}", field, value),
            Self::NonFiniteAmount { field } => write!(f, "non-finite {}", field),
        }
    }
}

/// An event whose calendar day has been parsed
#[derive(Debug, Clone, Copy)]
pub struct ValidatedEvent<'a> {
    pub day: NaiveDate,
    pub event: &'a ActivityEvent,
}

pub fn parse_day(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()
}

/// Check a single event, returning its parsed day.
pub fn check(event: &ActivityEvent) -> Result<NaiveDate, Rejection> {
    let day = parse_day(&event.date).ok_or_else(|| Rejection::UnparsableDate(event.date.clone()))?;

    for (field, value) in event.raw_amounts() {
        if !value.is_finite() {
            return Err(Rejection::NonFiniteAmount { field });
        }
        if value < 0.0 {
            return Err(Rejection::NegativeAmount { field, value });
        }
    }

    Ok(day)
}

/// Keep the well-formed events, logging every rejected one.
pub fn validate_events(events: &[ActivityEvent]) -> Vec<ValidatedEvent<'_>> {
    events
        .iter()
        .filter_map(|event| match check(event) {
            Ok(day) => Some(ValidatedEvent { day, event }),
            Err(reason) => {
                warn!(
                    subject = %event.subject_id,
                    occurred_at = %event.occurred_at,
                    %reason,
                    "Dropping activity event"
                );
                None
            }
        })
        .collect()
}
