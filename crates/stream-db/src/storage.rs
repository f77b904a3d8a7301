//! The storage contract every backing store must satisfy.
//!
//! Two operations cover everything the writer and the reader pool need:
//!
//! - [`Storage::insert_event`] -- idempotent on [`EventId`](stream_types::EventId).
//!   A duplicate insert is a silent no-op, and concurrent inserts of the
//!   same ID converge on exactly one row through the store's uniqueness
//!   constraint rather than application locking.
//! - [`Storage::get_event`] -- one event drawn uniformly at random from the
//!   matching set, or `None` when the window is empty.
//!
//! Implementations must be shareable across tasks; the same handle is used
//! by the writer and every reader worker at once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stream_types::Event;

use crate::error::DbError;

/// Persistence operations for stream events.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert `event`, doing nothing if a row with the same ID exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Insert`] on any failure other than the duplicate
    /// no-op.
    async fn insert_event(&self, event: &Event) -> Result<(), DbError>;

    /// Sample one event of `event_type` with `start <= time <= end`.
    ///
    /// Returns `Ok(None)` when nothing matches; that is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Query`] if the store could not be read, or
    /// [`DbError::Decode`] if the sampled row is corrupt.
    async fn get_event(
        &self,
        event_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Event>, DbError>;
}
