//! In-process implementation of the [`Storage`] contract.
//!
//! Events live in a [`BTreeMap`] keyed by [`EventId`], so the map's key
//! uniqueness plays the role of the `PostgreSQL` primary key. The write lock
//! makes check-and-insert atomic, which gives the same "exactly one row"
//! outcome under concurrent duplicate inserts.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use stream_types::{Event, EventId};
use tokio::sync::RwLock;

use crate::error::DbError;
use crate::storage::Storage;

/// A [`Storage`] backend that keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: RwLock<BTreeMap<EventId, Event>>,
}

impl MemoryEventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Whether the store holds no events.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    /// Whether an event with this ID is stored.
    pub async fn contains(&self, id: &EventId) -> bool {
        self.events.read().await.contains_key(id)
    }

    /// Count events of `event_type` with `start <= time <= end`.
    pub async fn count_events(
        &self,
        event_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> usize {
        self.events
            .read()
            .await
            .values()
            .filter(|e| matches_window(e, event_type, start, end))
            .count()
    }
}

#[async_trait]
impl Storage for MemoryEventStore {
    async fn insert_event(&self, event: &Event) -> Result<(), DbError> {
        let mut events = self.events.write().await;
        match events.entry(event.id().clone()) {
            Entry::Occupied(_) => {
                tracing::debug!(id = %event.id(), "Duplicate event ignored");
            }
            Entry::Vacant(slot) => {
                slot.insert(event.clone());
                tracing::debug!(id = %event.id(), event_type = event.event_type(), "Inserted event");
            }
        }
        Ok(())
    }

    async fn get_event(
        &self,
        event_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Event>, DbError> {
        let events = self.events.read().await;
        let matching: Vec<&Event> = events
            .values()
            .filter(|e| matches_window(e, event_type, start, end))
            .collect();

        let picked = {
            let mut rng = rand::rng();
            matching.choose(&mut rng).map(|e| (*e).clone())
        };
        Ok(picked)
    }
}

/// Inclusive window match, mirroring SQL `BETWEEN`.
fn matches_window(event: &Event, event_type: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    event.event_type() == event_type && event.time() >= start && event.time() <= end
}
