//! Shared event model for the event stream simulator.
//!
//! Every event is content-addressed: its identifier is a digest over the
//! event type, the Unix-second timestamp, and the canonical JSON encoding of
//! its extra fields. Identical inputs always produce the identical ID, which
//! makes the ID the sole deduplication key in storage.
//!
//! # Modules
//!
//! - [`ids`] -- The [`EventId`] newtype around the lowercase-hex digest
//! - [`value`] -- Dynamically typed field values and the [`ExtraFields`] map
//! - [`event`] -- The [`Event`] struct, identity computation, and the flat
//!   envelope encoding
//! - [`error`] -- Construction and decoding errors

pub mod error;
pub mod event;
pub mod ids;
pub mod value;

// Re-export all public types at crate root for convenience.
pub use error::EventError;
pub use event::Event;
pub use ids::EventId;
pub use value::{ExtraFields, FieldValue, RESERVED_KEYS, is_reserved};
