#![forbid(unsafe_code)]

use super::StoreError;
use super::support::{bind_values, describe_table, is_reserved_table};
use rowsync_core::{
    Catalog, Fragment, Identifier, Operation, OperationError, PreparedOperation, TableShape,
};
use rusqlite::{Connection, Transaction, TransactionBehavior, params_from_iter};
use tracing::{debug, info, warn};

/// What a committed batch did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub operations: usize,
    pub rows_changed: usize,
}

/// Backend capability the applier drives: look up a table, run one fragment.
///
/// Implementations run inside a transaction owned by the caller.
pub trait FragmentExecutor {
    fn describe_table(&mut self, table: &Identifier) -> Result<Option<TableShape>, rusqlite::Error>;

    /// Returns the number of rows changed.
    fn execute(&mut self, fragment: &Fragment) -> Result<usize, rusqlite::Error>;
}

impl FragmentExecutor for Transaction<'_> {
    fn describe_table(&mut self, table: &Identifier) -> Result<Option<TableShape>, rusqlite::Error> {
        describe_table(&**self, table)
    }

    fn execute(&mut self, fragment: &Fragment) -> Result<usize, rusqlite::Error> {
        let mut stmt = self.prepare(&fragment.sql)?;
        stmt.execute(params_from_iter(bind_values(&fragment.params)))
    }
}

/// Applies `operations` in order, stopping at the first failure.
///
/// Commit and rollback belong to the caller.
pub fn apply_operations<E>(
    executor: &mut E,
    operations: &[Operation],
) -> Result<BatchOutcome, StoreError>
where
    E: FragmentExecutor + ?Sized,
{
    let mut catalog = Catalog::new();
    let mut outcome = BatchOutcome::default();

    for (index, op) in operations.iter().enumerate() {
        let invalid = |source: OperationError| StoreError::Invalid { index, source };

        let prepared = PreparedOperation::new(op).map_err(invalid)?;
        let table = prepared.table();
        if is_reserved_table(table.as_str()) {
            return Err(invalid(OperationError::ReservedTable(table.to_string())));
        }

        if !catalog.contains(table) {
            let shape = executor
                .describe_table(table)
                .map_err(|source| StoreError::Execution { index, source })?;
            if let Some(shape) = shape {
                catalog.insert(table, shape);
            }
        }

        let fragment = prepared.render(&catalog).map_err(invalid)?;
        let changed = executor
            .execute(&fragment)
            .map_err(|source| StoreError::Execution { index, source })?;

        debug!(
            index,
            kind = %prepared.kind(),
            table = %table,
            rows = changed,
            "applied operation"
        );
        outcome.operations += 1;
        outcome.rows_changed += changed;
    }

    Ok(outcome)
}

/// Runs a whole batch in one IMMEDIATE transaction: all operations commit or none do.
pub(super) fn apply_batch(
    conn: &mut Connection,
    operations: &[Operation],
) -> Result<BatchOutcome, StoreError> {
    let mut tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    match apply_operations(&mut tx, operations) {
        Ok(outcome) => {
            tx.commit()?;
            info!(
                operations = outcome.operations,
                rows_changed = outcome.rows_changed,
                "batch committed"
            );
            Ok(outcome)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(error = %rollback_err, "rollback failed");
            }
            warn!(error = %err, "batch rolled back");
            Err(err)
        }
    }
}
