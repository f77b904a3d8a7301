//! Producer and consumer scheduling for the event stream simulator.
//!
//! A [`Writer`] generates one synthetic event per tick from the loaded
//! [`Schema`] and inserts it idempotently. A [`Reader`] coordinator pushes
//! one work unit per worker through a rendezvous [`gate`] on every tick,
//! and each worker samples a random event from a random trailing window.
//!
//! ```text
//! Schema --> EventGenerator --> Writer --insert_event--> Storage
//! ticker --> Reader coordinator --Gate--> N workers --get_event--> Storage --> log
//! ```
//!
//! # Modules
//!
//! - [`schema`] -- Schema file loading and validation
//! - [`generator`] -- Random field values per declared type
//! - [`gate`] -- Rendezvous hand-off between the coordinator and workers
//! - [`writer`] -- Ticker-driven event producer
//! - [`reader`] -- Ticker-driven sampling worker pool
//! - [`service`] -- [`StreamService`], owning one writer and one reader
//! - [`error`] -- Service error types

pub mod error;
pub mod gate;
pub mod generator;
pub mod reader;
pub mod schema;
pub mod service;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::ServiceError;
pub use generator::EventGenerator;
pub use reader::{ReadOutcome, Reader};
pub use schema::{EventSchema, FieldType, Schema, SchemaError};
pub use service::StreamService;
pub use writer::Writer;
