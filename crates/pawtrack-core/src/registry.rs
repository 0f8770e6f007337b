//! Memory-Bounded Alert Registry with LRU Eviction
//!
//! Holds the last computed alert set per subject. Each recomputation replaces
//! the subject's entry wholesale. When the registry is full, the alert-free
//! subject with the lowest eviction score is dropped: an evicted subject reads
//! back as `[]`, which is exactly what it held. Subjects with live alerts are
//! only removed by an explicit `evict` or `clear`, so the registry may grow
//! past `max_subjects` while every cached set has alerts.

use crate::aggregate::DailyTotals;
use crate::alert::AnomalyAlert;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Configuration for the alert registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Soft cap on cached subjects; only alert-free entries are evicted to honor it
    pub max_subjects: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_subjects: 100_000,
        }
    }
}

/// Bookkeeping for one cached subject
#[derive(Debug, Clone)]
pub struct SubjectMeta {
    /// When the entry was last replaced
    pub last_write: Instant,
    /// Number of recomputations stored for this subject
    pub recompute_count: u64,
    pub created_at: Instant,
}

impl SubjectMeta {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            last_write: now,
            recompute_count: 1,
            created_at: now,
        }
    }

    /// Lower = evicted first. Frequently recomputed, recently written
    /// subjects score higher.
    pub fn eviction_score(&self) -> f64 {
        let age_seconds = self.last_write.elapsed().as_secs_f64();
        let activity = (self.recompute_count as f64).ln().max(1.0);
        activity / (age_seconds + 1.0)
    }
}

/// Cached result of the latest computation for one subject
#[derive(Debug, Clone)]
pub struct AlertEntry {
    pub alerts: Vec<AnomalyAlert>,
    pub daily: Vec<DailyTotals>,
    pub computed_at: DateTime<Utc>,
    pub meta: SubjectMeta,
}

/// Statistics about the registry
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    pub total_subjects: usize,
    pub total_evictions: u64,
    pub total_replacements: u64,
    pub capacity: usize,
}

pub struct AlertRegistry {
    entries: HashMap<String, AlertEntry>,
    config: RegistryConfig,
    stats: RegistryStats,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            entries: HashMap::new(),
            stats: RegistryStats {
                capacity: config.max_subjects,
                ..Default::default()
            },
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            total_subjects: self.entries.len(),
            ..self.stats.clone()
        }
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.config.max_subjects
    }

    pub fn contains(&self, subject_id: &str) -> bool {
        self.entries.contains_key(subject_id)
    }

    pub fn get(&self, subject_id: &str) -> Option<&AlertEntry> {
        self.entries.get(subject_id)
    }

    /// Last computed alerts, empty if never computed or evicted
    pub fn alerts(&self, subject_id: &str) -> &[AnomalyAlert] {
        self.entries
            .get(subject_id)
            .map(|e| e.alerts.as_slice())
            .unwrap_or(&[])
    }

    /// Atomically replace a subject's alert set. Returns the alert-free
    /// subject evicted to make room, if any.
    pub fn replace(
        &mut self,
        subject_id: &str,
        alerts: Vec<AnomalyAlert>,
        daily: Vec<DailyTotals>,
        computed_at: DateTime<Utc>,
    ) -> Option<String> {
        self.stats.total_replacements += 1;

        if let Some(entry) = self.entries.get_mut(subject_id) {
            entry.alerts = alerts;
            entry.daily = daily;
            entry.computed_at = computed_at;
            entry.meta.last_write = Instant::now();
            entry.meta.recompute_count += 1;
            return None;
        }

        let evicted = if self.is_full() { self.evict_one() } else { None };
        if evicted.is_none() && self.is_full() {
            debug!(
                subject = subject_id,
                cached = self.entries.len(),
                "Registry over capacity, every cached subject has live alerts"
            );
        }

        self.entries.insert(
            subject_id.to_string(),
            AlertEntry {
                alerts,
                daily,
                computed_at,
                meta: SubjectMeta::new(),
            },
        );

        evicted
    }

    /// Drop a subject's cached set
    pub fn evict(&mut self, subject_id: &str) -> Option<AlertEntry> {
        self.entries.remove(subject_id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn evict_one(&mut self) -> Option<String> {
        let candidate = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.alerts.is_empty())
            .min_by(|a, b| {
                a.1.meta
                    .eviction_score()
                    .partial_cmp(&b.1.meta.eviction_score())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(subject, _)| subject.clone())?;

        self.entries.remove(&candidate);
        self.stats.total_evictions += 1;
        debug!(subject = %candidate, "Evicted cached alert set");
        Some(candidate)
    }
}

impl Default for AlertRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AnomalyKind, Severity};
    use crate::event::Metric;

    fn replace_empty(registry: &mut AlertRegistry, subject: &str) -> Option<String> {
        registry.replace(subject, Vec::new(), Vec::new(), Utc::now())
    }

    fn replace_alerting(registry: &mut AlertRegistry, subject: &str) -> Option<String> {
        let alert = AnomalyAlert {
            id: format!("{}-litter-outlier-2026-10-16", subject),
            metric: Metric::Litter,
            kind: AnomalyKind::Outlier,
            severity: Severity::Warning,
            description: String::new(),
            change_percent: 0,
            current_average: 1.29,
            previous_average: 0.0,
            window_days: 7,
            detected_at: Utc::now(),
        };
        registry.replace(subject, vec![alert], Vec::new(), Utc::now())
    }

    #[test]
    fn test_basic_operations() {
        let mut registry = AlertRegistry::new();
        assert!(registry.alerts("luna").is_empty());

        replace_empty(&mut registry, "luna");
        replace_empty(&mut registry, "rex");
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("luna"));

        replace_empty(&mut registry, "luna");
        assert_eq!(registry.get("luna").unwrap().meta.recompute_count, 2);
        assert_eq!(registry.stats().total_replacements, 3);

        assert!(registry.evict("luna").is_some());
        assert!(!registry.contains("luna"));
        assert!(registry.evict("luna").is_none());
    }

    #[test]
    fn test_eviction_when_full() {
        let mut registry = AlertRegistry::with_config(RegistryConfig { max_subjects: 3 });

        replace_empty(&mut registry, "a");
        replace_empty(&mut registry, "b");
        replace_empty(&mut registry, "c");
        assert!(registry.is_full());

        // Updating an existing subject never evicts
        assert!(replace_empty(&mut registry, "a").is_none());

        let evicted = replace_empty(&mut registry, "d");
        assert!(evicted.is_some());
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("d"));
        assert_eq!(registry.stats().total_evictions, 1);
    }

    #[test]
    fn test_live_alert_sets_survive_capacity_pressure() {
        let mut registry = AlertRegistry::with_config(RegistryConfig { max_subjects: 2 });

        replace_alerting(&mut registry, "luna");
        replace_empty(&mut registry, "rex");

        // only the alert-free entry may go
        assert_eq!(replace_alerting(&mut registry, "milo"), Some("rex".to_string()));
        assert_eq!(registry.alerts("luna").len(), 1);

        // nothing left to drop: grow past the cap instead
        assert!(replace_empty(&mut registry, "bella").is_none());
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.alerts("luna").len(), 1);
        assert_eq!(registry.alerts("milo").len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut registry = AlertRegistry::new();
        replace_empty(&mut registry, "a");
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.subjects().count(), 0);
    }
}
