#![forbid(unsafe_code)]

use crate::ident::IdentifierError;
use crate::ops::OperationKind;

/// Caller-fixable problems with an operation, detected before any statement runs.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    #[error("table name cannot be empty")]
    MissingTable,
    #[error("id is required for {kind} operation")]
    MissingId { kind: OperationKind },
    #[error("data is required for {kind} operation")]
    MissingData { kind: OperationKind },
    #[error("no updatable columns provided")]
    NoUpdatableColumns,
    #[error("invalid identifier {name:?}: {source}")]
    InvalidIdentifier {
        name: String,
        #[source]
        source: IdentifierError,
    },
    #[error("unknown table {0:?}")]
    UnknownTable(String),
    #[error("column {column:?} given more than once")]
    DuplicateColumn { column: String },
    #[error("unknown column {column:?} on table {table:?}")]
    UnknownColumn { table: String, column: String },
    #[error("table {table:?} has no id column")]
    MissingIdColumn { table: String },
    #[error("table {0:?} is reserved")]
    ReservedTable(String),
}
