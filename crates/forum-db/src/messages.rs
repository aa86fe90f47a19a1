use std::sync::Arc;

use tracing::debug;

use crate::models::NOW;
use crate::{Database, Result};

#[derive(Clone)]
pub struct MessageStore {
    db: Arc<Database>,
}

impl MessageStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Appends a message to a thread. Neither the thread nor the author
    /// is looked up first.
    pub fn create(&self, body: &str, thread_id: i64, author_id: i64) -> Result<i64> {
        let id = self.db.with_conn_mut(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO messages (body, thread_id, author_id, created) VALUES (?1, ?2, ?3, {NOW})"
                ),
                (body, thread_id, author_id),
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        debug!(message_id = id, thread_id, author_id, "message created");
        Ok(id)
    }
}
