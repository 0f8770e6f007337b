//! # pawtrack-sim
//!
//! Synthetic activity journals with known anomalies, for exercising the
//! detector end to end.
//!
//! ```text
//!   Scenario ──► JournalGenerator ──► JSON lines ──► read_journal ──► detect_journal
//!   (targets)     (noisy entries)                    (per line)       (per subject)
//! ```

pub mod generator;
pub mod scenarios;

pub use generator::JournalGenerator;
pub use scenarios::{DayProfile, Scenario, list_scenarios};

use chrono::{DateTime, TimeZone};
use pawtrack_core::{ActivityEvent, AnomalyAlert, DetectorConfig, detect_anomalies};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::BufRead;
use tracing::warn;

/// Alert set for one subject of a journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectReport {
    pub subject_id: String,
    pub event_count: usize,
    pub alerts: Vec<AnomalyAlert>,
}

/// Parse one event per line. Blank lines are skipped; malformed lines are
/// logged and skipped.
pub fn read_journal(reader: impl BufRead) -> std::io::Result<Vec<ActivityEvent>> {
    let mut events = Vec::new();

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<ActivityEvent>(trimmed) {
            Ok(event) => events.push(event),
            Err(e) => warn!(line = n + 1, error = %e, "Skipping malformed journal line"),
        }
    }

    Ok(events)
}

/// Run the detector once per subject, in subject order
pub fn detect_journal<Tz: TimeZone>(
    events: Vec<ActivityEvent>,
    config: &DetectorConfig,
    now: &DateTime<Tz>,
) -> Vec<SubjectReport> {
    let mut by_subject: BTreeMap<String, Vec<ActivityEvent>> = BTreeMap::new();
    for event in events {
        by_subject
            .entry(event.subject_id.clone())
            .or_default()
            .push(event);
    }

    by_subject
        .into_iter()
        .map(|(subject_id, events)| SubjectReport {
            alerts: detect_anomalies(&subject_id, &events, config, now),
            event_count: events.len(),
            subject_id,
        })
        .collect()
}
