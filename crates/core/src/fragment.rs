#![forbid(unsafe_code)]

//! Rendering of operations into SQLite statements.
//!
//! Table and column names reach the statement text only as quoted
//! [`Identifier`]s that the [`Catalog`] knows about; every value, the row id
//! included, is a numbered `?N` parameter.

use crate::catalog::Catalog;
use crate::error::OperationError;
use crate::ident::Identifier;
use crate::ops::{Operation, OperationKind, RowData, Scalar, is_id_column};
use std::collections::BTreeSet;

const QUOTED_ID: &str = "\"id\"";

/// One rendered statement plus its bound parameters, in placeholder order.
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub params: Vec<Scalar>,
}

/// An operation that passed every check not needing the catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedOperation {
    kind: OperationKind,
    table: Identifier,
    id: String,
    columns: Vec<(Identifier, Scalar)>,
}

impl PreparedOperation {
    pub fn new(op: &Operation) -> Result<Self, OperationError> {
        let table = op.table_identifier()?;
        let id = op.row_id()?;
        let columns = match op.kind {
            OperationKind::Put => {
                let data = required_data(op)?;
                column_values(data)?
            }
            OperationKind::Patch => {
                let data = required_data(op)?;
                let columns = column_values(data)?;
                if columns.is_empty() {
                    return Err(OperationError::NoUpdatableColumns);
                }
                columns
            }
            OperationKind::Delete => Vec::new(),
        };
        Ok(Self {
            kind: op.kind,
            table,
            id,
            columns,
        })
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn table(&self) -> &Identifier {
        &self.table
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn render(&self, catalog: &Catalog) -> Result<Fragment, OperationError> {
        catalog.resolve(&self.table)?;
        for (column, _) in &self.columns {
            catalog.check_column(&self.table, column)?;
        }
        Ok(match self.kind {
            OperationKind::Put => self.render_put(),
            OperationKind::Patch => self.render_patch(),
            OperationKind::Delete => self.render_delete(),
        })
    }

    fn render_put(&self) -> Fragment {
        let mut names = vec![QUOTED_ID.to_string()];
        let mut params = vec![Scalar::Text(self.id.clone())];
        for (column, value) in &self.columns {
            names.push(column.quoted());
            params.push(value.clone());
        }
        let placeholders = (1..=params.len())
            .map(|n| format!("?{n}"))
            .collect::<Vec<_>>()
            .join(", ");

        let conflict = if self.columns.is_empty() {
            "DO NOTHING".to_string()
        } else {
            let assignments = self
                .columns
                .iter()
                .map(|(column, _)| {
                    let quoted = column.quoted();
                    format!("{quoted} = excluded.{quoted}")
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("DO UPDATE SET {assignments}")
        };

        Fragment {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({placeholders}) ON CONFLICT ({QUOTED_ID}) {conflict}",
                self.table.quoted(),
                names.join(", "),
            ),
            params,
        }
    }

    fn render_patch(&self) -> Fragment {
        let mut params = Vec::with_capacity(self.columns.len() + 1);
        let mut assignments = Vec::with_capacity(self.columns.len());
        for (column, value) in &self.columns {
            params.push(value.clone());
            assignments.push(format!("{} = ?{}", column.quoted(), params.len()));
        }
        params.push(Scalar::Text(self.id.clone()));

        Fragment {
            sql: format!(
                "UPDATE {} SET {} WHERE {QUOTED_ID} = ?{}",
                self.table.quoted(),
                assignments.join(", "),
                params.len(),
            ),
            params,
        }
    }

    fn render_delete(&self) -> Fragment {
        Fragment {
            sql: format!("DELETE FROM {} WHERE {QUOTED_ID} = ?1", self.table.quoted()),
            params: vec![Scalar::Text(self.id.clone())],
        }
    }
}

/// Validates and renders in one step.
pub fn render(op: &Operation, catalog: &Catalog) -> Result<Fragment, OperationError> {
    PreparedOperation::new(op)?.render(catalog)
}

fn required_data(op: &Operation) -> Result<&RowData, OperationError> {
    op.data
        .as_ref()
        .filter(|data| !data.is_empty())
        .ok_or(OperationError::MissingData { kind: op.kind })
}

// The id column is addressed through the operation id, never through `data`.
// Column names compare case-insensitively, so `done` and `DONE` collide.
fn column_values(data: &RowData) -> Result<Vec<(Identifier, Scalar)>, OperationError> {
    let mut out = Vec::with_capacity(data.len());
    let mut seen = BTreeSet::new();
    for (name, value) in data {
        if is_id_column(name) {
            continue;
        }
        let column = Identifier::try_new(name.as_str()).map_err(|source| {
            OperationError::InvalidIdentifier {
                name: name.clone(),
                source,
            }
        })?;
        if !seen.insert(column.as_str().to_ascii_lowercase()) {
            return Err(OperationError::DuplicateColumn {
                column: name.clone(),
            });
        }
        out.push((column, value.clone()));
    }
    Ok(out)
}
