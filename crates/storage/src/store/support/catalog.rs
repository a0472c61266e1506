#![forbid(unsafe_code)]

use rowsync_core::{Identifier, TableShape};
use rusqlite::{Connection, params};

/// Reads the column list of `table`; `None` when no such table exists.
pub(in crate::store) fn describe_table(
    conn: &Connection,
    table: &Identifier,
) -> Result<Option<TableShape>, rusqlite::Error> {
    let mut stmt = conn.prepare_cached("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map(params![table.as_str()], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    if columns.is_empty() {
        return Ok(None);
    }
    Ok(Some(TableShape::new(columns)))
}
