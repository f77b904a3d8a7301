//! Error types for event construction and envelope decoding.

/// Errors that can occur when building or decoding an [`Event`](crate::Event).
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// The envelope is missing a required key or a key has the wrong shape.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// An extra field uses a key reserved for the envelope.
    #[error("extra field `{0}` collides with a reserved envelope key")]
    ReservedField(String),

    /// The event type is an empty string.
    #[error("event type must not be empty")]
    EmptyType,

    /// JSON encoding of the field payload failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
