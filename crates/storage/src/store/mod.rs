#![forbid(unsafe_code)]

mod applier;
mod checkpoint;
mod config;
mod error;
mod support;

pub use applier::{BatchOutcome, FragmentExecutor, apply_operations};
pub use config::{DEFAULT_BUSY_TIMEOUT, DEFAULT_POOL_SIZE, SqliteLocation, StoreConfig};
pub use error::StoreError;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rowsync_core::Operation;
use rusqlite::Connection;
use std::sync::Arc;
use tracing::{info, instrument};

/// The two things a sync backend needs from storage.
pub trait Persister: Send + Sync + std::fmt::Debug {
    /// Applies every operation or none of them.
    fn apply_batch(&self, batch: &[Operation]) -> Result<BatchOutcome, StoreError>;

    /// Returns the next checkpoint for the pair, starting at 1.
    fn create_checkpoint(&self, user_id: &str, client_id: &str) -> Result<i64, StoreError>;
}

/// Opens the persister for whatever backend `config` names.
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn Persister>, StoreError> {
    Ok(Arc::new(SqlitePersister::open(config)?))
}

pub struct SqlitePersister {
    pool: Pool<SqliteConnectionManager>,
    location: SqliteLocation,
}

impl SqlitePersister {
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let location = config.location()?;
        let busy_timeout = config.busy_timeout;

        let pool = match &location {
            SqliteLocation::Memory => {
                // Every connection to ":memory:" is its own database, so the pool
                // holds exactly one and never recycles it.
                let manager = SqliteConnectionManager::memory()
                    .with_init(move |conn| init_connection(conn, busy_timeout));
                let pool = Pool::builder()
                    .max_size(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .build(manager)?;
                let conn = pool.get()?;
                support::install_schema(&conn)?;
                drop(conn);
                pool
            }
            SqliteLocation::File(path) => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent)?;
                }

                // WAL is a property of the file; set it once before readers pile in.
                let bootstrap = Connection::open(path)?;
                bootstrap.busy_timeout(busy_timeout)?;
                bootstrap.pragma_update(None, "journal_mode", "WAL")?;
                support::install_schema(&bootstrap)?;
                drop(bootstrap);

                let manager = SqliteConnectionManager::file(path)
                    .with_init(move |conn| init_connection(conn, busy_timeout));
                Pool::builder().max_size(config.pool_size).build(manager)?
            }
        };

        info!(
            location = %location.describe(),
            pool_size = pool.max_size(),
            "persister ready"
        );
        Ok(Self { pool, location })
    }

    pub fn location(&self) -> &SqliteLocation {
        &self.location
    }
}

impl std::fmt::Debug for SqlitePersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePersister")
            .field("location", &self.location)
            .field("pool_size", &self.pool.max_size())
            .finish()
    }
}

impl Persister for SqlitePersister {
    #[instrument(skip_all, fields(operations = batch.len()))]
    fn apply_batch(&self, batch: &[Operation]) -> Result<BatchOutcome, StoreError> {
        let mut conn = self.pool.get()?;
        applier::apply_batch(&mut conn, batch)
    }

    #[instrument(skip(self))]
    fn create_checkpoint(&self, user_id: &str, client_id: &str) -> Result<i64, StoreError> {
        let conn = self.pool.get()?;
        checkpoint::bump_checkpoint(&conn, user_id, client_id)
    }
}

fn init_connection(
    conn: &mut Connection,
    busy_timeout: std::time::Duration,
) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}
