//! Database-level settings for [`SqliteStore`].
//!
//! These live next to the issues so that a copied database keeps its own
//! defaults (currently only `default_project`, written by `tk init`).

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;

pub(crate) fn set_config_on_conn(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        r#"INSERT INTO config (key, value) VALUES (?1, ?2)
           ON CONFLICT (key) DO UPDATE SET value = excluded.value"#,
        params![key, value],
    )?;
    Ok(())
}

pub(crate) fn get_config_on_conn(conn: &Connection, key: &str) -> Result<String> {
    conn.query_row("SELECT value FROM config WHERE key = ?1", params![key], |row| {
        row.get(0)
    })
    .optional()?
    .ok_or_else(|| StorageError::not_found("setting", key))
}

impl SqliteStore {
    pub fn set_config_impl(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        set_config_on_conn(&conn, key, value)
    }

    pub fn get_config_impl(&self, key: &str) -> Result<String> {
        let conn = self.lock_conn()?;
        get_config_on_conn(&conn, key)
    }
}
