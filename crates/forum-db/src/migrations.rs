use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, threads, messages)");
        // Email uniqueness is checked by UserStore, not by a constraint.
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              INTEGER PRIMARY KEY,
                username        TEXT NOT NULL,
                email           TEXT NOT NULL,
                password_hash   TEXT NOT NULL
            );

            CREATE INDEX idx_users_email ON users(email);

            CREATE TABLE threads (
                id          INTEGER PRIMARY KEY,
                title       TEXT NOT NULL,
                author_id   INTEGER NOT NULL REFERENCES users(id),
                created     TEXT NOT NULL
            );

            CREATE INDEX idx_threads_created ON threads(created);

            CREATE TABLE messages (
                id          INTEGER PRIMARY KEY,
                body        TEXT NOT NULL,
                author_id   INTEGER NOT NULL REFERENCES users(id),
                thread_id   INTEGER NOT NULL REFERENCES threads(id),
                created     TEXT NOT NULL
            );

            CREATE INDEX idx_messages_thread ON messages(thread_id, created);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (sessions)");
        conn.execute_batch(
            "
            CREATE TABLE sessions (
                id          TEXT PRIMARY KEY,
                data        TEXT NOT NULL,
                expires_at  INTEGER NOT NULL
            );

            CREATE INDEX idx_sessions_expires ON sessions(expires_at);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
