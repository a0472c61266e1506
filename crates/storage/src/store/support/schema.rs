#![forbid(unsafe_code)]

use super::super::StoreError;
use rusqlite::Connection;

pub(in crate::store) const CHECKPOINTS_TABLE: &str = "checkpoints";

// User tables are owned by the application; only the counter table is ours.
const SQL: &str = r#"
        CREATE TABLE IF NOT EXISTS checkpoints (
          user_id TEXT NOT NULL,
          client_id TEXT NOT NULL,
          checkpoint INTEGER NOT NULL,
          PRIMARY KEY (user_id, client_id)
        );
"#;

pub(in crate::store) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SQL)?;
    Ok(())
}

/// Tables a batch may never write to.
pub(in crate::store) fn is_reserved_table(name: &str) -> bool {
    name.eq_ignore_ascii_case(CHECKPOINTS_TABLE)
        || name
            .get(..7)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("sqlite_"))
}
