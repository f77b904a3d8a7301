//! Error types for the writer and reader services.
//!
//! Steady-state failures (a failed insert, a failed read) are logged and
//! never surface here. [`ServiceError`] only covers misconfiguration that
//! prevents a loop from starting at all.

use stream_types::EventError;

/// Errors that stop a writer or reader before or while it runs.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The reader pool was asked to start with zero workers.
    #[error("reader pool needs at least one worker")]
    NoWorkers,

    /// A zero tick interval was configured.
    #[error("interval must be greater than zero")]
    ZeroInterval,

    /// The schema declares no event types.
    #[error("schema declares no event types")]
    EmptySchema,

    /// The event type is not declared in the schema.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// A generated event could not be constructed.
    #[error("event error: {source}")]
    Event {
        /// The underlying event error.
        #[from]
        source: EventError,
    },
}
