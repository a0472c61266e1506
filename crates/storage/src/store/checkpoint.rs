#![forbid(unsafe_code)]

use super::StoreError;
use rusqlite::{Connection, params};
use tracing::debug;

// One statement: the increment and the read-back cannot be separated.
const BUMP_SQL: &str = r#"
    INSERT INTO checkpoints(user_id, client_id, checkpoint)
    VALUES (?1, ?2, 1)
    ON CONFLICT(user_id, client_id) DO UPDATE SET checkpoint = checkpoint + 1
    RETURNING checkpoint
"#;

/// Creates the (user, client) counter at 1 or advances it by one; returns the new value.
pub(super) fn bump_checkpoint(
    conn: &Connection,
    user_id: &str,
    client_id: &str,
) -> Result<i64, StoreError> {
    if user_id.trim().is_empty() {
        return Err(StoreError::InvalidInput("user_id must not be empty"));
    }
    if client_id.trim().is_empty() {
        return Err(StoreError::InvalidInput("client_id must not be empty"));
    }

    let checkpoint = conn.query_row(BUMP_SQL, params![user_id, client_id], |row| {
        row.get::<_, i64>(0)
    })?;
    debug!(user_id, client_id, checkpoint, "checkpoint advanced");
    Ok(checkpoint)
}
