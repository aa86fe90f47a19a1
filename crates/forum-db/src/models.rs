//! Read projections of the stored rows. Nothing here outlives a request;
//! the database stays the source of truth.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

/// SQL expression producing the stored timestamp format.
pub(crate) const NOW: &str = "strftime('%Y-%m-%d %H:%M:%f', 'now')";

/// Maps one result row onto a value. The same mapper serves
/// `query_row` and `query_map`.
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct Thread {
    pub id: i64,
    pub title: String,
    pub author: User,
    pub created: DateTime<Utc>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: i64,
    pub body: String,
    pub author: User,
    pub thread_id: i64,
    pub created: DateTime<Utc>,
}

/// Columns: `id, username, email`.
impl FromRow for User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
        })
    }
}

/// Columns: `t.id, t.title, t.created, u.id, u.username, u.email`.
/// Messages are left empty for the caller to hydrate.
impl FromRow for Thread {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Thread {
            id: row.get(0)?,
            title: row.get(1)?,
            created: timestamp(row, 2)?,
            author: User {
                id: row.get(3)?,
                username: row.get(4)?,
                email: row.get(5)?,
            },
            messages: Vec::new(),
        })
    }
}

/// Columns: `m.id, m.body, m.thread_id, m.created, u.id, u.username, u.email`.
impl FromRow for Message {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Message {
            id: row.get(0)?,
            body: row.get(1)?,
            thread_id: row.get(2)?,
            created: timestamp(row, 3)?,
            author: User {
                id: row.get(4)?,
                username: row.get(5)?,
                email: row.get(6)?,
            },
        })
    }
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS[.fff]" without a
/// timezone; they are always UTC.
fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map(|ndt| ndt.and_utc())
}
