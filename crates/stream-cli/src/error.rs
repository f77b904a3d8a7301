//! Error types for the `stream` binary.
//!
//! Wraps every startup failure so `main` can report one message and exit.

use stream_core::{SchemaError, ServiceError};
use stream_db::DbError;

/// Errors that abort the `stream` process.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The schema file could not be loaded.
    #[error("schema error: {source}")]
    Schema {
        /// The underlying schema error.
        #[from]
        source: SchemaError,
    },

    /// Connecting to or migrating the database failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: DbError,
    },

    /// The writer or reader could not start.
    #[error("service error: {source}")]
    Service {
        /// The underlying service error.
        #[from]
        source: ServiceError,
    },

    /// A required option is missing for the chosen backend.
    #[error("config error: {0}")]
    Config(String),
}
