#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod fragment;
pub mod ident;
pub mod ops;

pub use catalog::{Catalog, TableShape};
pub use error::OperationError;
pub use fragment::{Fragment, PreparedOperation, render};
pub use ident::{Identifier, IdentifierError};
pub use ops::{
    BatchRequest, CheckpointRequest, ID_COLUMN, Operation, OperationBody, OperationKind, RowData,
    Scalar, UnknownOperationKind,
};
