//! Command-line arguments for the `stream` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use stream_db::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_MAX_CONNECTIONS, PostgresConfig,
};

/// Default writer tick interval in milliseconds.
const DEFAULT_WRITER_INTERVAL_MS: u64 = 5_000;

/// Default reader tick interval in milliseconds.
const DEFAULT_READER_INTERVAL_MS: u64 = 1_000;

/// Default number of reader workers.
const DEFAULT_WORKERS: usize = 10;

/// Write synthetic events to a store and sample them back.
#[derive(Debug, Parser)]
#[command(name = "stream")]
#[command(about = "Event stream simulator: schema-driven writer and sampling reader")]
#[command(long_about = None)]
pub struct Cli {
    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// What to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Storage and schema options.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// `PostgreSQL` connection URL.
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub db_source_name: Option<String>,

    /// Path to the event schema (JSON, or YAML by `.yaml`/`.yml` extension).
    #[arg(long, env = "STREAM_SCHEMA", value_name = "PATH", global = true)]
    pub schema: Option<PathBuf>,

    /// Maximum connections in the `PostgreSQL` pool.
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS, global = true)]
    pub max_connections: u32,

    /// Seconds to wait for a `PostgreSQL` connection before giving up.
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS, global = true)]
    pub connect_timeout_secs: u64,

    /// Seconds before an unused pooled connection is closed.
    #[arg(long, default_value_t = DEFAULT_IDLE_TIMEOUT_SECS, global = true)]
    pub idle_timeout_secs: u64,

    /// Keep events in process memory instead of `PostgreSQL`.
    #[arg(long, global = true)]
    pub memory: bool,
}

impl GlobalArgs {
    /// Pool settings for `url` taken from the connection flags.
    pub fn postgres_config(&self, url: &str) -> PostgresConfig {
        PostgresConfig::new(url)
            .with_max_connections(self.max_connections)
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .with_idle_timeout(Duration::from_secs(self.idle_timeout_secs))
    }
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate and insert one event per interval.
    Writer {
        /// Milliseconds between events.
        #[arg(long, default_value_t = DEFAULT_WRITER_INTERVAL_MS)]
        interval_ms: u64,

        /// Run database migrations before starting.
        #[arg(long)]
        migrate: bool,
    },

    /// Sample random events with a pool of workers.
    Reader {
        /// Milliseconds between rounds of reads.
        #[arg(long, default_value_t = DEFAULT_READER_INTERVAL_MS)]
        interval_ms: u64,

        /// Number of reader workers; each performs one read per round.
        #[arg(long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Run database migrations before starting.
        #[arg(long)]
        migrate: bool,
    },

    /// Run a writer and a reader pool in one process over one store.
    Run {
        /// Milliseconds between written events.
        #[arg(long, default_value_t = DEFAULT_WRITER_INTERVAL_MS)]
        writer_interval_ms: u64,

        /// Milliseconds between rounds of reads.
        #[arg(long, default_value_t = DEFAULT_READER_INTERVAL_MS)]
        reader_interval_ms: u64,

        /// Number of reader workers.
        #[arg(long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Run database migrations before starting.
        #[arg(long)]
        migrate: bool,
    },

    /// Apply the embedded database migrations and exit.
    Migrate,
}
