//! [`SqliteStore`] -- SQLite-backed storage implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::sqlite::schema;

/// SQLite-backed implementation of the [`IssueStore`](crate::traits::IssueStore) trait.
///
/// The connection sits behind a `Mutex`; operation modules take it through
/// [`SqliteStore::lock_conn`] and run their `*_on_conn` helpers on it.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database file at `path` and brings its schema
    /// up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening issue database");
        let conn = Connection::open(path).map_err(|e| {
            StorageError::Connection(format!("failed to open {}: {e}", path.display()))
        })?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(|e| StorageError::Connection(format!("failed to enable WAL: {e}")))?;
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        debug!("opening in-memory issue database");
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("failed to open in-memory db: {e}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(|e| StorageError::Connection(format!("failed to set pragmas: {e}")))?;
        migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquires the connection lock.
    pub(crate) fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Connection(format!("mutex poisoned: {e}")))
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Schema setup
// ---------------------------------------------------------------------------

/// Schema version recorded in the database header.
fn schema_version(conn: &Connection) -> Result<i32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Creates missing tables and seeds default config in one transaction.
fn migrate(conn: &mut Connection) -> Result<()> {
    let found = schema_version(conn)?;
    if found >= schema::CURRENT_SCHEMA_VERSION {
        debug!(version = found, "schema up to date");
        return Ok(());
    }

    let tx = conn
        .transaction()
        .map_err(|e| StorageError::Transaction(e.to_string()))?;

    for (i, stmt) in schema::SCHEMA_STATEMENTS.iter().enumerate() {
        tx.execute_batch(stmt).map_err(|e| StorageError::Migration {
            name: format!("schema statement {i}"),
            reason: e.to_string(),
        })?;
    }

    for &(key, value) in schema::DEFAULT_CONFIG {
        tx.execute(
            "INSERT OR IGNORE INTO config (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }

    tx.pragma_update(None, "user_version", schema::CURRENT_SCHEMA_VERSION)?;
    tx.commit()
        .map_err(|e| StorageError::Transaction(e.to_string()))?;

    info!(
        from = found,
        to = schema::CURRENT_SCHEMA_VERSION,
        "issue database schema initialized"
    );
    Ok(())
}
