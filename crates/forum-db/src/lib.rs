pub mod error;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod sessions;
pub mod threads;
pub mod users;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::info;

pub use error::{Result, StoreError};
pub use messages::MessageStore;
pub use models::{Message, Thread, User};
pub use sessions::SessionRows;
pub use threads::{LATEST_THREADS, ThreadStore};
pub use users::UserStore;

const READER_POOL_SIZE: usize = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared SQLite handle.
///
/// Writes are serialised through a single connection. Reads rotate over
/// read-only connections, which WAL lets run next to an open write.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
}

impl Database {
    /// Opens (creating if needed) and migrates the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let writer = Connection::open(path)?;
        writer.busy_timeout(BUSY_TIMEOUT)?;
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&writer)?;

        // Readers are opened after migrating so they never see a half-built schema.
        let readers = (0..READER_POOL_SIZE)
            .map(|_| open_reader(path).map(Mutex::new))
            .collect::<Result<Vec<_>>>()?;

        info!(path = %path.display(), readers = readers.len(), "database ready");
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            next_reader: AtomicUsize::new(0),
        })
    }

    /// Runs `f` on one of the read-only connections.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let slot = self.next_reader.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        f(&*lock(&self.readers[slot])?)
    }

    /// Runs `f` on the writer connection.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        f(&*lock(&self.writer)?)
    }
}

fn open_reader(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| StoreError::Poisoned(e.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;

    /// Opens a fresh database in a temporary directory. Keep the
    /// returned `TempDir` alive for as long as the database is used.
    pub fn open_temp() -> (TempDir, Arc<Database>) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("forum.db")).unwrap();
        (dir, Arc::new(db))
    }

    /// Inserts a user row directly, skipping the (slow) password hash.
    pub fn insert_user(db: &Database, username: &str, email: &str) -> i64 {
        db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, 'x')",
                (username, email),
            )?;
            Ok(conn.last_insert_rowid())
        })
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::open_temp;

    #[test]
    fn reopening_keeps_schema_version() {
        let (dir, db) = open_temp();
        drop(db);

        let db = super::Database::open(&dir.path().join("forum.db")).unwrap();
        let version: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(version, 2);
    }

    #[test]
    fn readers_reject_writes() {
        let (_dir, db) = open_temp();
        let result = db.with_conn(|conn| {
            conn.execute("INSERT INTO users (username, email, password_hash) VALUES ('a', 'b', 'c')", [])?;
            Ok(())
        });
        assert!(result.is_err());
    }
}
