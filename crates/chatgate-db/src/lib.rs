pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::info;

/// Handle to the conversation store.
///
/// Holds only the location of the database. Every operation opens its own
/// connection and drops it before returning, so nothing is shared between
/// requests.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open the store at `path`, creating the schema if it is missing.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Self {
            path: path.to_path_buf(),
        };

        db.with_conn(|conn| {
            // WAL so history reads don't block chat inserts
            let _mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            migrations::run(conn)
        })?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Run `f` on a fresh connection. The connection is closed when this
    /// returns, on success and on error alike.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = Connection::open(&self.path)?;
        f(&mut conn)
    }
}
