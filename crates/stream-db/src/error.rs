//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] errors with additional context about which operation failed.
//! Only [`DbError::Unavailable`] and [`DbError::Migration`] are fatal at
//! startup; insert and query failures are reported per operation.

use stream_types::EventError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The store could not be reached (connect or ping failed).
    #[error("storage unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// Inserting an event failed for a reason other than a duplicate ID.
    #[error("failed to insert event {id}: {source}")]
    Insert {
        /// ID of the event that could not be written.
        id: String,
        /// The underlying driver error.
        source: sqlx::Error,
    },

    /// Sampling an event failed.
    #[error("failed to query {event_type} events: {source}")]
    Query {
        /// Event type that was being sampled.
        event_type: String,
        /// The underlying driver error.
        source: sqlx::Error,
    },

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be turned back into an event.
    #[error("corrupt event row {id}: {source}")]
    Decode {
        /// ID of the offending row.
        id: String,
        /// Why the row was rejected.
        source: EventError,
    },

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
