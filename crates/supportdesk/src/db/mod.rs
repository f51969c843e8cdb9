//! SQLite storage for emails and knowledge-base articles.
//!
//! One connection behind a mutex, shared by the HTTP handlers and the mail
//! poller. Repository modules are free functions over [`Database`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;

pub mod email_repo;
pub mod error;
pub mod kb_repo;
pub mod migrations;
pub mod stats_repo;

pub use error::DatabaseError;

/// How long a write waits on a lock held by another process (e.g. a backup
/// tool reading the file) before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the support desk store. Clones share one connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the store at `path`, creating the file and its parent
    /// directories on first use, and brings the schema up to date.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Self::prepare(conn)?;

        log::info!("Support desk store opened at {}", path.display());
        Ok(db)
    }

    /// A throwaway store with the full schema, for tests and demos.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, DatabaseError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::run_all(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` while holding the connection lock.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// `~/.supportdesk/data/supportdesk.db`, used when no path is configured.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".supportdesk").join("data").join("supportdesk.db"))
}
