#![forbid(unsafe_code)]

use rowsync_core::OperationError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("connection pool: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("batch[{index}]: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: OperationError,
    },
    #[error("batch[{index}]: sqlite: {source}")]
    Execution {
        index: usize,
        #[source]
        source: rusqlite::Error,
    },
}

impl StoreError {
    /// True when the caller can fix the request; false for operational failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::Invalid { .. })
    }

    /// Position of the operation that aborted the batch, if one did.
    pub fn operation_index(&self) -> Option<usize> {
        match self {
            Self::Invalid { index, .. } | Self::Execution { index, .. } => Some(*index),
            _ => None,
        }
    }
}
