//! Instrumented [`Storage`] used by the writer and reader tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stream_db::{DbError, MemoryEventStore, Storage};
use stream_types::Event;

/// How a [`CountingStore`] answers calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behavior {
    /// Delegate to the in-memory store.
    Normal,
    /// Fail every call.
    Failing,
    /// Inserts never complete; reads delegate.
    HangingInsert,
}

/// Counts calls and delegates to a [`MemoryEventStore`].
#[derive(Debug)]
pub(crate) struct CountingStore {
    inner: MemoryEventStore,
    behavior: Behavior,
    inserts: AtomicUsize,
    reads: AtomicUsize,
}

impl CountingStore {
    pub(crate) fn new(behavior: Behavior) -> Self {
        Self {
            inner: MemoryEventStore::new(),
            behavior,
            inserts: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) const fn inner(&self) -> &MemoryEventStore {
        &self.inner
    }

    fn injected() -> DbError {
        DbError::Config(String::from("injected failure"))
    }
}

#[async_trait]
impl Storage for CountingStore {
    async fn insert_event(&self, event: &Event) -> Result<(), DbError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Normal => self.inner.insert_event(event).await,
            Behavior::Failing => Err(Self::injected()),
            Behavior::HangingInsert => std::future::pending().await,
        }
    }

    async fn get_event(
        &self,
        event_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Event>, DbError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Failing => Err(Self::injected()),
            Behavior::Normal | Behavior::HangingInsert => {
                self.inner.get_event(event_type, start, end).await
            }
        }
    }
}
