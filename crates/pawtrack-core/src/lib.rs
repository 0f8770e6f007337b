//! pawtrack-core: health-metric anomaly detection for activity journals.
//!
//! Given all food, water and litter events for one subject, the detector
//! builds a dense two-week day window, compares the two half-window averages
//! and flags drops, spikes and single-day outliers as severity-tagged alerts.

pub mod aggregate;
pub mod alert;
pub mod config;
pub mod detector;
pub mod error;
pub mod event;
pub mod registry;
pub mod rules;
pub mod service;
pub mod store;
pub mod validate;
pub mod window;

pub use aggregate::DailyTotals;
pub use alert::{AnomalyAlert, AnomalyKind, Severity, alert_id};
pub use config::{DetectorConfig, MetricThresholds};
pub use detector::{Detection, detect, detect_anomalies};
pub use error::{ConfigError, StoreError};
pub use event::{ActivityEvent, EventId, Metric};
pub use registry::{AlertRegistry, RegistryConfig};
pub use service::{AnomalyService, Clock, FixedClock, SystemClock};
pub use store::{EventStore, InMemoryEventStore};
