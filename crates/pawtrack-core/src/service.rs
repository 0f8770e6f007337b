//! Anomaly Service
//!
//! Owns the event store and the per-subject alert cache. Every mutation of a
//! subject's events is followed by a full recompute-and-replace for that
//! subject. The service takes `&mut self` for writes, so whoever owns it is
//! the single writer for its subjects.

use crate::aggregate::DailyTotals;
use crate::alert::AnomalyAlert;
use crate::config::DetectorConfig;
use crate::detector::detect;
use crate::error::StoreError;
use crate::event::{ActivityEvent, EventId};
use crate::registry::{AlertRegistry, RegistryConfig, RegistryStats};
use crate::store::{EventStore, InMemoryEventStore};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::debug;

/// Source of "now" for recomputations triggered through the service
pub trait Clock: Send {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock viewed at a fixed UTC offset
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    pub offset: FixedOffset,
}

impl SystemClock {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Clamps to the valid +/- 24h range.
    pub fn with_offset_minutes(minutes: i32) -> Self {
        let seconds = minutes.saturating_mul(60).clamp(-86_399, 86_399);
        match FixedOffset::east_opt(seconds) {
            Some(offset) => Self { offset },
            None => Self::utc(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

pub struct AnomalyService<S: EventStore = InMemoryEventStore> {
    store: S,
    alerts: AlertRegistry,
    config: DetectorConfig,
    clock: Box<dyn Clock>,
}

impl AnomalyService<InMemoryEventStore> {
    pub fn in_memory(config: DetectorConfig) -> Self {
        Self::new(InMemoryEventStore::new(), config)
    }
}

impl<S: EventStore> AnomalyService<S> {
    pub fn new(store: S, config: DetectorConfig) -> Self {
        Self {
            store,
            alerts: AlertRegistry::new(),
            config,
            clock: Box::new(SystemClock::utc()),
        }
    }

    pub fn with_registry_config(mut self, registry_config: RegistryConfig) -> Self {
        self.alerts = AlertRegistry::with_config(registry_config);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry_stats(&self) -> RegistryStats {
        self.alerts.stats()
    }

    /// Record an event and recompute its subject
    pub fn add_event(&mut self, event: ActivityEvent) -> EventId {
        let subject = event.subject_id.clone();
        let id = self.store.insert(event);
        self.recalc_anomalies(&subject);
        id
    }

    /// Replace an event and recompute its subject
    pub fn update_event(&mut self, id: EventId, event: ActivityEvent) -> Result<(), StoreError> {
        let subject = event.subject_id.clone();
        self.store.update(id, event)?;
        self.recalc_anomalies(&subject);
        Ok(())
    }

    /// Remove an event and recompute its subject
    pub fn remove_event(&mut self, id: EventId) -> Result<ActivityEvent, StoreError> {
        let removed = self.store.remove(id)?;
        self.recalc_anomalies(&removed.subject_id);
        Ok(removed)
    }

    /// Recompute using the service clock
    pub fn recalc_anomalies(&mut self, subject_id: &str) -> &[AnomalyAlert] {
        let now = self.clock.now();
        self.recalc_anomalies_at(subject_id, &now)
    }

    /// Recompute at an explicit instant and replace the cached set
    pub fn recalc_anomalies_at(
        &mut self,
        subject_id: &str,
        now: &DateTime<FixedOffset>,
    ) -> &[AnomalyAlert] {
        let events = self.store.events_for_subject(subject_id);
        let detection = detect(subject_id, &events, &self.config, now);

        debug!(
            subject = subject_id,
            alerts = detection.alerts.len(),
            "Replaced alert set"
        );

        self.alerts.replace(
            subject_id,
            detection.alerts,
            detection.daily,
            detection.detected_at,
        );
        self.alerts.alerts(subject_id)
    }

    /// Last computed alerts; empty if never computed
    pub fn get_anomalies(&self, subject_id: &str) -> &[AnomalyAlert] {
        self.alerts.alerts(subject_id)
    }

    /// Daily totals from the last computation, if cached
    pub fn daily_totals(&self, subject_id: &str) -> Option<&[DailyTotals]> {
        self.alerts.get(subject_id).map(|e| e.daily.as_slice())
    }

    /// Daily totals for the window ending at `now`, without touching the cache
    pub fn daily_totals_at(&self, subject_id: &str, now: &DateTime<FixedOffset>) -> Vec<DailyTotals> {
        let events = self.store.events_for_subject(subject_id);
        detect(subject_id, &events, &self.config, now).daily
    }

    /// Forget the cached alert set; events are untouched
    pub fn evict(&mut self, subject_id: &str) -> bool {
        self.alerts.evict(subject_id).is_some()
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AnomalyKind;
    use crate::event::Metric;
    use chrono::{Days, NaiveDate, TimeZone};

    fn frozen() -> FixedClock {
        FixedClock(
            FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2026, 10, 16, 9, 0, 0)
                .unwrap(),
        )
    }

    fn day(n_ago: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .checked_sub_days(Days::new(n_ago))
            .unwrap()
    }

    fn service() -> AnomalyService {
        AnomalyService::in_memory(DetectorConfig::default()).with_clock(frozen())
    }

    #[test]
    fn test_get_before_compute_is_empty() {
        let svc = service();
        assert!(svc.get_anomalies("luna").is_empty());
        assert!(svc.daily_totals("luna").is_none());
    }

    #[test]
    fn test_mutations_trigger_recompute() {
        let mut svc = service();
        let id = svc.add_event(ActivityEvent::on_day("luna", day(0)).with_water(650.0));

        let alerts = svc.get_anomalies("luna");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric, Metric::Water);
        assert_eq!(alerts[0].kind, AnomalyKind::Outlier);

        svc.update_event(id, ActivityEvent::on_day("luna", day(0)).with_water(100.0))
            .unwrap();
        assert!(svc.get_anomalies("luna").is_empty());

        svc.update_event(id, ActivityEvent::on_day("luna", day(0)).with_water(700.0))
            .unwrap();
        assert_eq!(svc.get_anomalies("luna").len(), 1);

        svc.remove_event(id).unwrap();
        assert!(svc.get_anomalies("luna").is_empty());
        assert_eq!(svc.daily_totals("luna").map(|d| d.len()), Some(14));
    }

    #[test]
    fn test_subjects_are_isolated() {
        let mut svc = service();
        svc.add_event(ActivityEvent::on_day("luna", day(0)).with_litter(9.0));
        svc.add_event(ActivityEvent::on_day("rex", day(0)).with_litter(1.0));

        assert_eq!(svc.get_anomalies("luna").len(), 1);
        assert!(svc.get_anomalies("rex").is_empty());
    }

    #[test]
    fn test_full_registry_keeps_live_alerts() {
        let mut svc = service().with_registry_config(RegistryConfig { max_subjects: 1 });
        svc.add_event(ActivityEvent::on_day("luna", day(0)).with_litter(9.0));
        assert_eq!(svc.get_anomalies("luna").len(), 1);

        svc.add_event(ActivityEvent::on_day("rex", day(0)).with_food(10.0));
        assert_eq!(svc.get_anomalies("luna").len(), 1);
        assert!(svc.get_anomalies("rex").is_empty());

        // an alert-free subject is the one that gives way
        svc.add_event(ActivityEvent::on_day("milo", day(0)).with_water(650.0));
        assert_eq!(svc.get_anomalies("luna").len(), 1);
        assert_eq!(svc.get_anomalies("milo").len(), 1);
        assert_eq!(svc.registry_stats().total_evictions, 1);
    }

    #[test]
    fn test_evict_then_recompute() {
        let mut svc = service();
        svc.add_event(ActivityEvent::on_day("luna", day(0)).with_litter(9.0));
        let before = svc.get_anomalies("luna").to_vec();

        assert!(svc.evict("luna"));
        assert!(svc.get_anomalies("luna").is_empty());

        let after = svc.recalc_anomalies("luna").to_vec();
        assert_eq!(before, after);
    }

    #[test]
    fn test_update_unknown_event() {
        let mut svc = service();
        let err = svc
            .update_event(EventId::new(), ActivityEvent::on_day("luna", day(0)))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownEvent(_)));
    }

    #[test]
    fn test_system_clock_offset() {
        let clock = SystemClock::with_offset_minutes(-300);
        assert_eq!(clock.now().offset().local_minus_utc(), -300 * 60);
        let clamped = SystemClock::with_offset_minutes(i32::MAX);
        assert_eq!(clamped.now().offset().local_minus_utc(), 86_399);
    }
}
