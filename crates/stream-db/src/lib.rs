//! Storage layer for the event stream simulator.
//!
//! The writer and the reader pool only ever talk to the [`Storage`] trait.
//! Two backends implement it:
//!
//! ```text
//! Writer ----insert_event----+
//!                            +--> Storage --> EventStore       (PostgreSQL)
//! Reader pool --get_event----+            --> MemoryEventStore (tests, --memory)
//! ```
//!
//! # Modules
//!
//! - [`storage`] -- The [`Storage`] contract (idempotent insert, random sample)
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`event_store`] -- `PostgreSQL` implementation of [`Storage`]
//! - [`memory`] -- In-process implementation of [`Storage`]
//! - [`error`] -- Shared error types

pub mod error;
pub mod event_store;
pub mod memory;
pub mod postgres;
pub mod storage;

// Re-export primary types for convenience.
pub use error::DbError;
pub use event_store::{EventRow, EventStore};
pub use memory::MemoryEventStore;
pub use postgres::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_MAX_CONNECTIONS, PostgresConfig,
    PostgresPool,
};
pub use storage::Storage;
