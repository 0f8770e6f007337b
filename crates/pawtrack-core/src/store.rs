//! Event Store contract
//!
//! The detector only needs "all events for subject X". The mutation half of
//! the trait exists so a service can trigger recomputation on add/edit/remove.

use crate::error::StoreError;
use crate::event::{ActivityEvent, EventId};
use std::collections::HashMap;

pub trait EventStore {
    /// Every event recorded for the subject, in any order
    fn events_for_subject(&self, subject_id: &str) -> Vec<ActivityEvent>;

    fn insert(&mut self, event: ActivityEvent) -> EventId;

    /// Replace an event in place. The replacement must keep the same subject.
    fn update(&mut self, id: EventId, event: ActivityEvent) -> Result<(), StoreError>;

    fn remove(&mut self, id: EventId) -> Result<ActivityEvent, StoreError>;
}

#[derive(Debug, Clone)]
struct StoredEvent {
    id: EventId,
    event: ActivityEvent,
}

/// Subject-keyed in-memory store
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    by_subject: HashMap<String, Vec<StoredEvent>>,
    index: HashMap<EventId, String>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored events
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn subject_count(&self) -> usize {
        self.by_subject.len()
    }

    /// Subject an event belongs to
    pub fn subject_of(&self, id: EventId) -> Option<&str> {
        self.index.get(&id).map(String::as_str)
    }

    pub fn get(&self, id: EventId) -> Option<&ActivityEvent> {
        let subject = self.index.get(&id)?;
        self.by_subject
            .get(subject)?
            .iter()
            .find(|s| s.id == id)
            .map(|s| &s.event)
    }

    fn slot_mut(&mut self, id: EventId) -> Result<&mut StoredEvent, StoreError> {
        let subject = self.index.get(&id).ok_or(StoreError::UnknownEvent(id))?;
        self.by_subject
            .get_mut(subject)
            .and_then(|events| events.iter_mut().find(|s| s.id == id))
            .ok_or(StoreError::UnknownEvent(id))
    }
}

impl EventStore for InMemoryEventStore {
    fn events_for_subject(&self, subject_id: &str) -> Vec<ActivityEvent> {
        self.by_subject
            .get(subject_id)
            .map(|events| events.iter().map(|s| s.event.clone()).collect())
            .unwrap_or_default()
    }

    fn insert(&mut self, event: ActivityEvent) -> EventId {
        let id = EventId::new();
        self.index.insert(id, event.subject_id.clone());
        self.by_subject
            .entry(event.subject_id.clone())
            .or_default()
            .push(StoredEvent { id, event });
        id
    }

    fn update(&mut self, id: EventId, event: ActivityEvent) -> Result<(), StoreError> {
        let slot = self.slot_mut(id)?;
        if slot.event.subject_id != event.subject_id {
            return Err(StoreError::SubjectMismatch {
                expected: slot.event.subject_id.clone(),
                found: event.subject_id,
            });
        }
        slot.event = event;
        Ok(())
    }

    fn remove(&mut self, id: EventId) -> Result<ActivityEvent, StoreError> {
        let subject = self.index.remove(&id).ok_or(StoreError::UnknownEvent(id))?;
        let events = self
            .by_subject
            .get_mut(&subject)
            .ok_or(StoreError::UnknownEvent(id))?;
        let pos = events
            .iter()
            .position(|s| s.id == id)
            .ok_or(StoreError::UnknownEvent(id))?;
        let removed = events.swap_remove(pos);
        if events.is_empty() {
            self.by_subject.remove(&subject);
        }
        Ok(removed.event)
    }
}
