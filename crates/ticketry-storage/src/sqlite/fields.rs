//! Raw custom field row persistence for [`SqliteStore`].
//!
//! Rows are never updated in place: saving an issue deletes its rows and
//! re-inserts the ones carried on the struct.

use rusqlite::{Connection, params};

use ticketry_core::enums::FieldType;
use ticketry_core::field::FieldRow;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Connection-level helpers
// ---------------------------------------------------------------------------

/// Loads the field rows of an issue in insertion order.
pub(crate) fn load_fields_on_conn(conn: &Connection, issue_id: i64) -> Result<Vec<FieldRow>> {
    let mut stmt = conn.prepare(
        "SELECT name, value, type, ordinal FROM issue_fields WHERE issue_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![issue_id], |row| {
        let name: String = row.get(0)?;
        let value: Option<String> = row.get(1)?;
        let field_type: String = row.get(2)?;
        let ordinal: i64 = row.get(3)?;
        Ok(FieldRow::new(name, value, FieldType::from(field_type)).with_ordinal(ordinal))
    })?;

    let mut fields = Vec::new();
    for row in rows {
        fields.push(row?);
    }
    Ok(fields)
}

/// Inserts field rows for an issue.
pub(crate) fn insert_fields_on_conn(
    conn: &Connection,
    issue_id: i64,
    fields: &[FieldRow],
) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO issue_fields (issue_id, name, value, type, ordinal) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for row in fields {
        stmt.execute(params![
            issue_id,
            row.name,
            row.value,
            row.field_type.as_str(),
            row.ordinal,
        ])?;
    }
    Ok(())
}

/// Replaces all field rows of an issue.
pub(crate) fn replace_fields_on_conn(
    conn: &Connection,
    issue_id: i64,
    fields: &[FieldRow],
) -> Result<()> {
    conn.execute(
        "DELETE FROM issue_fields WHERE issue_id = ?1",
        params![issue_id],
    )?;
    insert_fields_on_conn(conn, issue_id, fields)
}
