use std::sync::Arc;

use rusqlite::OptionalExtension;
use tracing::debug;

use crate::{Database, Result};

/// Raw session rows. The payload is opaque to this crate; expiry is a
/// unix timestamp in seconds.
#[derive(Clone)]
pub struct SessionRows {
    db: Arc<Database>,
}

impl SessionRows {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Inserts a new session. Returns `false` if the id is already taken.
    pub fn insert_new(&self, id: &str, data: &str, expires_at: i64) -> Result<bool> {
        self.db.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO sessions (id, data, expires_at) VALUES (?1, ?2, ?3)",
                (id, data, expires_at),
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn save(&self, id: &str, data: &str, expires_at: i64) -> Result<()> {
        self.db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, data, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET data = excluded.data, expires_at = excluded.expires_at",
                (id, data, expires_at),
            )?;
            Ok(())
        })
    }

    /// Payload of a session that is still live at `now`.
    pub fn load(&self, id: &str, now: i64) -> Result<Option<String>> {
        self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT data FROM sessions WHERE id = ?1 AND expires_at > ?2",
                    (id, now),
                    |row| row.get(0),
                )
                .optional()?)
        })
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.db.with_conn_mut(|conn| {
            conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// Removes every session that expired at or before `now`.
    pub fn delete_expired(&self, now: i64) -> Result<usize> {
        let removed = self.db.with_conn_mut(|conn| {
            Ok(conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", [now])?)
        })?;
        if removed > 0 {
            debug!(removed, "expired sessions deleted");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::open_temp;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn insert_new_refuses_taken_ids() {
        let (_dir, db) = open_temp();
        let rows = SessionRows::new(db);

        assert!(rows.insert_new("abc", "{}", NOW + 60).unwrap());
        assert!(!rows.insert_new("abc", r#"{"other":1}"#, NOW + 60).unwrap());
        assert_eq!(rows.load("abc", NOW).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn save_overwrites_payload_and_expiry() {
        let (_dir, db) = open_temp();
        let rows = SessionRows::new(db);

        rows.save("abc", "one", NOW + 10).unwrap();
        rows.save("abc", "two", NOW + 100).unwrap();

        assert_eq!(rows.load("abc", NOW + 50).unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn expired_rows_are_hidden_then_pruned() {
        let (_dir, db) = open_temp();
        let rows = SessionRows::new(db.clone());

        rows.save("old", "x", NOW - 1).unwrap();
        rows.save("edge", "x", NOW).unwrap();
        rows.save("live", "y", NOW + 3600).unwrap();

        assert_eq!(rows.load("old", NOW).unwrap(), None);
        assert_eq!(rows.load("edge", NOW).unwrap(), None);

        assert_eq!(rows.delete_expired(NOW).unwrap(), 2);
        assert_eq!(rows.delete_expired(NOW).unwrap(), 0);

        let left: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM sessions", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(left, 1);
        assert_eq!(rows.load("live", NOW).unwrap().as_deref(), Some("y"));
    }

    #[test]
    fn delete_removes_the_row() {
        let (_dir, db) = open_temp();
        let rows = SessionRows::new(db);

        rows.save("abc", "x", NOW + 60).unwrap();
        rows.delete("abc").unwrap();
        rows.delete("missing").unwrap();

        assert_eq!(rows.load("abc", NOW).unwrap(), None);
    }
}
