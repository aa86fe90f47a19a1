use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::models::{FromRow, Message, NOW, Thread};
use crate::{Database, Result, StoreError};

/// Number of threads shown on the front page.
pub const LATEST_THREADS: u32 = 10;

/// Direction in which a thread's messages are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageOrder {
    Ascending,
    Descending,
}

impl MessageOrder {
    fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

#[derive(Clone)]
pub struct ThreadStore {
    db: Arc<Database>,
}

impl ThreadStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Inserts a thread stamped with the current time. The author is not
    /// checked here.
    pub fn create(&self, title: &str, author_id: i64) -> Result<i64> {
        let id = self.db.with_conn_mut(|conn| {
            conn.execute(
                &format!("INSERT INTO threads (title, author_id, created) VALUES (?1, ?2, {NOW})"),
                (title, author_id),
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        debug!(thread_id = id, author_id, "thread created");
        Ok(id)
    }

    /// Loads a thread with its author and its messages, oldest first.
    pub fn get(&self, id: i64) -> Result<Thread> {
        self.db.with_conn(|conn| {
            let thread = conn
                .query_row(
                    "SELECT t.id, t.title, t.created, u.id, u.username, u.email
                     FROM threads t
                     JOIN users u ON t.author_id = u.id
                     WHERE t.id = ?1",
                    [id],
                    Thread::from_row,
                )
                .optional()?
                .ok_or(StoreError::NotFound)?;

            hydrate(conn, thread, MessageOrder::Ascending)
        })
    }

    /// Loads the newest `limit` threads, newest first. Each thread's
    /// messages are also newest first, unlike `get`.
    pub fn latest(&self, limit: u32) -> Result<Vec<Thread>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.title, t.created, u.id, u.username, u.email
                 FROM threads t
                 JOIN users u ON t.author_id = u.id
                 ORDER BY t.created DESC, t.id DESC
                 LIMIT ?1",
            )?;

            let threads = stmt
                .query_map([limit], Thread::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            threads
                .into_iter()
                .map(|thread| hydrate(conn, thread, MessageOrder::Descending))
                .collect()
        })
    }
}

fn hydrate(conn: &Connection, mut thread: Thread, order: MessageOrder) -> Result<Thread> {
    thread.messages = query_messages(conn, thread.id, order)?;
    Ok(thread)
}

fn query_messages(conn: &Connection, thread_id: i64, order: MessageOrder) -> Result<Vec<Message>> {
    // Ties on `created` fall back to insertion order.
    let dir = order.sql();
    let mut stmt = conn.prepare(&format!(
        "SELECT m.id, m.body, m.thread_id, m.created, u.id, u.username, u.email
         FROM messages m
         JOIN users u ON m.author_id = u.id
         WHERE m.thread_id = ?1
         ORDER BY m.created {dir}, m.id {dir}"
    ))?;

    let rows = stmt
        .query_map([thread_id], Message::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
