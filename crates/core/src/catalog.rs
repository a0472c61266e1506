#![forbid(unsafe_code)]

use crate::error::OperationError;
use crate::ident::Identifier;
use crate::ops::is_id_column;
use std::collections::BTreeMap;

/// Columns of one table as reported by the backing store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableShape {
    columns: Vec<String>,
}

impl TableShape {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &Identifier) -> bool {
        self.columns.iter().any(|known| column.matches(known))
    }

    pub fn has_id_column(&self) -> bool {
        self.columns.iter().any(|known| is_id_column(known))
    }
}

/// Allow-list of tables a batch may touch. Keys are folded to ASCII lowercase.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    tables: BTreeMap<String, TableShape>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: &Identifier, shape: TableShape) -> Self {
        self.insert(table, shape);
        self
    }

    pub fn insert(&mut self, table: &Identifier, shape: TableShape) {
        self.tables.insert(fold(table), shape);
    }

    pub fn contains(&self, table: &Identifier) -> bool {
        self.tables.contains_key(&fold(table))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Looks up a table that operations may address by `id`.
    pub fn resolve(&self, table: &Identifier) -> Result<&TableShape, OperationError> {
        let shape = self
            .tables
            .get(&fold(table))
            .ok_or_else(|| OperationError::UnknownTable(table.to_string()))?;
        if !shape.has_id_column() {
            return Err(OperationError::MissingIdColumn {
                table: table.to_string(),
            });
        }
        Ok(shape)
    }

    pub fn check_column(
        &self,
        table: &Identifier,
        column: &Identifier,
    ) -> Result<(), OperationError> {
        let shape = self.resolve(table)?;
        if shape.has_column(column) {
            Ok(())
        } else {
            Err(OperationError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
        }
    }
}

fn fold(table: &Identifier) -> String {
    table.as_str().to_ascii_lowercase()
}
