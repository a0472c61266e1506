#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use rowsync_storage::{DEFAULT_BUSY_TIMEOUT, DEFAULT_POOL_SIZE, StoreConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Apply batched row mutations and issue sync checkpoints.
///
/// Request bodies are JSON, read from FILE or stdin; replies are JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "rowsync", version)]
pub(crate) struct Cli {
    /// `sqlite://<path>`, `sqlite::memory:`, or a bare database path.
    #[arg(long, env = "ROWSYNC_DATABASE_URI")]
    pub database_uri: String,

    #[arg(long, env = "ROWSYNC_POOL_SIZE", default_value_t = DEFAULT_POOL_SIZE)]
    pub pool_size: u32,

    #[arg(
        long,
        env = "ROWSYNC_BUSY_TIMEOUT_MS",
        default_value_t = DEFAULT_BUSY_TIMEOUT.as_millis() as u64
    )]
    pub busy_timeout_ms: u64,

    /// Filter directive, e.g. `debug` or `info,rowsync_storage=trace`.
    #[arg(long, env = "ROWSYNC_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub(crate) fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.database_uri.clone())
            .with_pool_size(self.pool_size)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Apply `{"batch": [...]}`; every operation names its own `op`.
    Batch { file: Option<PathBuf> },
    /// Upsert one row: `{"table", "id"?, "data"}`.
    Put { file: Option<PathBuf> },
    /// Update the given columns of one row: `{"table", "id", "data"}`.
    Patch { file: Option<PathBuf> },
    /// Delete one row: `{"table", "id"}`.
    Delete { file: Option<PathBuf> },
    /// Advance the checkpoint of a (user, client) pair and print it.
    Checkpoint {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        client_id: Option<String>,
        /// Optional `{"user_id", "client_id"}` body; flags win over it.
        file: Option<PathBuf>,
    },
}
