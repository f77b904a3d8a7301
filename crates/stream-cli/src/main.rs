//! Entry point for the event stream simulator.
//!
//! Loads the event schema, opens the event store (`PostgreSQL` or in-memory)
//! and runs the writer, the reader pool, or both until Ctrl-C.
//!
//! ```text
//! stream --schema events.json --db-source-name postgresql://... writer --migrate
//! stream --schema events.json reader --workers 10
//! stream --schema events.json --memory run
//! ```

mod cli;
mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use stream_core::{Schema, StreamService};
use stream_db::{MemoryEventStore, PostgresPool, Storage};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, GlobalArgs};
use crate::error::CliError;

/// Application entry point.
///
/// Initializes logging, parses arguments, installs the Ctrl-C handler and
/// dispatches to the chosen subcommand.
///
/// # Errors
///
/// Returns an error if the schema cannot be loaded, the store cannot be
/// reached, or a service fails to start.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let cancel = CancellationToken::new();
    listen_for_shutdown(cancel.clone());

    run(cli, cancel).await?;
    Ok(())
}

/// Cancel `cancel` on the first Ctrl-C.
fn listen_for_shutdown(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                cancel.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<(), CliError> {
    let Cli { global, command } = cli;

    match command {
        Command::Migrate => {
            let pool = connect(&global).await?;
            pool.run_migrations().await?;
            pool.close().await;
        }
        Command::Writer {
            interval_ms,
            migrate,
        } => {
            let backend = Backend::open(&global, migrate).await?;
            let result = backend
                .service
                .run_writer(cancel, Duration::from_millis(interval_ms))
                .await;
            backend.close().await;
            result?;
        }
        Command::Reader {
            interval_ms,
            workers,
            migrate,
        } => {
            let backend = Backend::open(&global, migrate).await?;
            let result = backend
                .service
                .run_reader(cancel, Duration::from_millis(interval_ms), workers)
                .await;
            backend.close().await;
            result?;
        }
        Command::Run {
            writer_interval_ms,
            reader_interval_ms,
            workers,
            migrate,
        } => {
            let backend = Backend::open(&global, migrate).await?;
            let writer = async {
                let result = backend
                    .service
                    .run_writer(cancel.clone(), Duration::from_millis(writer_interval_ms))
                    .await;
                cancel_on_error(&cancel, result)
            };
            let reader = async {
                let result = backend
                    .service
                    .run_reader(
                        cancel.clone(),
                        Duration::from_millis(reader_interval_ms),
                        workers,
                    )
                    .await;
                cancel_on_error(&cancel, result)
            };

            // Both halves run to completion so the reader can join its workers.
            let (written, read) = tokio::join!(writer, reader);
            backend.close().await;
            written?;
            read?;
        }
    }

    info!("stream exiting");
    Ok(())
}

/// Stop the other half of a `run` when one half fails.
fn cancel_on_error<T, E>(cancel: &CancellationToken, result: Result<T, E>) -> Result<T, E> {
    if result.is_err() {
        cancel.cancel();
    }
    result
}

/// The service plus the pool backing it, if any.
struct Backend {
    service: StreamService,
    pool: Option<PostgresPool>,
}

impl Backend {
    /// Load the schema and open the configured store.
    async fn open(global: &GlobalArgs, migrate: bool) -> Result<Self, CliError> {
        let schema_path = global.schema.as_deref().ok_or_else(|| {
            CliError::Config(String::from("--schema (or STREAM_SCHEMA) is required"))
        })?;
        let schema = Arc::new(load_schema(schema_path)?);

        if global.memory {
            if migrate {
                warn!("--migrate has no effect with --memory");
            }
            info!("Using in-memory event store");
            let store: Arc<dyn Storage> = Arc::new(MemoryEventStore::new());
            return Ok(Self {
                service: StreamService::new(store, schema),
                pool: None,
            });
        }

        let pool = connect(global).await?;
        if migrate {
            pool.run_migrations().await?;
        }
        let store: Arc<dyn Storage> = Arc::new(pool.event_store());
        Ok(Self {
            service: StreamService::new(store, schema),
            pool: Some(pool),
        })
    }

    async fn close(self) {
        if let Some(pool) = self.pool {
            pool.close().await;
        }
    }
}

fn load_schema(path: &Path) -> Result<Schema, CliError> {
    let schema = Schema::from_file(path)?;
    info!(
        path = %path.display(),
        event_types = schema.len(),
        "Schema loaded"
    );
    Ok(schema)
}

async fn connect(global: &GlobalArgs) -> Result<PostgresPool, CliError> {
    let url = global.db_source_name.as_deref().ok_or_else(|| {
        CliError::Config(String::from(
            "--db-source-name (or DATABASE_URL) is required unless --memory is set",
        ))
    })?;
    Ok(PostgresPool::connect(&global.postgres_config(url)).await?)
}
