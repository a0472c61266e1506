#![forbid(unsafe_code)]

use crate::error::OperationError;
use crate::ident::Identifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const ID_COLUMN: &str = "id";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum OperationKind {
    Put,
    Patch,
    Delete,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation type {0:?}")]
pub struct UnknownOperationKind(pub String);

impl FromStr for OperationKind {
    type Err = UnknownOperationKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("put") {
            Ok(Self::Put)
        } else if trimmed.eq_ignore_ascii_case("patch") {
            Ok(Self::Patch)
        } else if trimmed.eq_ignore_ascii_case("delete") {
            Ok(Self::Delete)
        } else {
            Err(UnknownOperationKind(value.to_string()))
        }
    }
}

impl TryFrom<String> for OperationKind {
    type Error = UnknownOperationKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A column value. Only scalars are accepted; nested arrays or objects fail to parse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Scalar {
    /// Text form of a value usable as a primary key.
    pub fn as_key_text(&self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value.clone()),
            Self::Integer(value) => Some(value.to_string()),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

pub type RowData = BTreeMap<String, Scalar>;

/// One mutation intent against a caller-named table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "op")]
    pub kind: OperationKind,
    #[serde(default)]
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RowData>,
}

impl Operation {
    pub fn put(table: impl Into<String>, id: impl Into<String>, data: RowData) -> Self {
        Self {
            kind: OperationKind::Put,
            table: table.into(),
            id: Some(id.into()),
            data: Some(data),
        }
    }

    pub fn patch(table: impl Into<String>, id: impl Into<String>, data: RowData) -> Self {
        Self {
            kind: OperationKind::Patch,
            table: table.into(),
            id: Some(id.into()),
            data: Some(data),
        }
    }

    pub fn delete(table: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Delete,
            table: table.into(),
            id: Some(id.into()),
            data: None,
        }
    }

    pub fn table_identifier(&self) -> Result<Identifier, OperationError> {
        if self.table.trim().is_empty() {
            return Err(OperationError::MissingTable);
        }
        Identifier::try_new(self.table.as_str()).map_err(|source| {
            OperationError::InvalidIdentifier {
                name: self.table.clone(),
                source,
            }
        })
    }

    /// Primary key of the target row. A PUT may carry it inside `data` instead.
    pub fn row_id(&self) -> Result<String, OperationError> {
        let explicit = self
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string);
        let fallback = || match self.kind {
            OperationKind::Put => self
                .data
                .as_ref()
                .and_then(|data| find_id_value(data))
                .and_then(Scalar::as_key_text)
                .filter(|id| !id.trim().is_empty()),
            OperationKind::Patch | OperationKind::Delete => None,
        };
        explicit
            .or_else(fallback)
            .ok_or(OperationError::MissingId { kind: self.kind })
    }
}

pub(crate) fn is_id_column(name: &str) -> bool {
    name.eq_ignore_ascii_case(ID_COLUMN)
}

fn find_id_value(data: &RowData) -> Option<&Scalar> {
    data.iter()
        .find(|(column, _)| is_id_column(column))
        .map(|(_, value)| value)
}

/// Body of the generic batch endpoint; each operation names its own kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub batch: Vec<Operation>,
}

/// Body of a per-kind endpoint; the endpoint decides the kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationBody {
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub data: Option<RowData>,
}

impl OperationBody {
    pub fn into_operation(self, kind: OperationKind) -> Operation {
        Operation {
            kind,
            table: self.table.unwrap_or_default(),
            id: self.id,
            data: self.data,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRequest {
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
    #[serde(default, alias = "clientId")]
    pub client_id: Option<String>,
}
