#![forbid(unsafe_code)]

use super::StoreError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_POOL_SIZE: u32 = 8;
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub database_uri: String,
    pub pool_size: u32,
    pub busy_timeout: Duration,
}

impl StoreConfig {
    pub fn new(database_uri: impl Into<String>) -> Self {
        Self {
            database_uri: database_uri.into(),
            pool_size: DEFAULT_POOL_SIZE,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn location(&self) -> Result<SqliteLocation, StoreError> {
        if self.pool_size == 0 {
            return Err(StoreError::Config(
                "pool size must be at least 1".to_string(),
            ));
        }
        SqliteLocation::parse(&self.database_uri)
    }
}

/// Where the database lives.
///
/// Accepted forms: `:memory:`, `sqlite::memory:`, `sqlite://<path>`,
/// `sqlite:<path>`, or a bare filesystem path. `sqlite:///abs/path` keeps the
/// leading slash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqliteLocation {
    Memory,
    File(PathBuf),
}

impl SqliteLocation {
    pub fn parse(uri: &str) -> Result<Self, StoreError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(StoreError::Config("database uri is empty".to_string()));
        }

        let rest = if let Some(rest) = uri.strip_prefix("sqlite:") {
            rest.strip_prefix("//").unwrap_or(rest)
        } else if let Some((scheme, _)) = uri.split_once("://") {
            return Err(StoreError::Config(format!(
                "unsupported database scheme '{scheme}'"
            )));
        } else {
            uri
        };

        match rest {
            "" => Err(StoreError::Config(format!(
                "database uri has no path: {uri}"
            ))),
            ":memory:" => Ok(Self::Memory),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Memory => ":memory:".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}
