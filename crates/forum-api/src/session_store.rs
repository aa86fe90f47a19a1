//! SQLite-backed session storage for tower-sessions.

use std::time::Duration;

use async_trait::async_trait;
use forum_db::SessionRows;
use time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion, SessionStore};
use tracing::warn;

/// How often expired sessions are swept from the table.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct SqliteSessionStore {
    rows: SessionRows,
}

impl std::fmt::Debug for SqliteSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSessionStore").finish_non_exhaustive()
    }
}

impl SqliteSessionStore {
    pub fn new(rows: SessionRows) -> Self {
        Self { rows }
    }
}

async fn run<F, T>(f: F) -> session_store::Result<T>
where
    F: FnOnce() -> forum_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| session_store::Error::Backend(e.to_string()))?
        .map_err(|e| session_store::Error::Backend(e.to_string()))
}

fn encode(record: &Record) -> session_store::Result<String> {
    serde_json::to_string(record).map_err(|e| session_store::Error::Encode(e.to_string()))
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        // Ids are random; on the rare collision draw a new one.
        loop {
            let data = encode(record)?;
            let (rows, id, expires_at) = (
                self.rows.clone(),
                record.id.to_string(),
                record.expiry_date.unix_timestamp(),
            );
            if run(move || rows.insert_new(&id, &data, expires_at)).await? {
                return Ok(());
            }
            record.id = Id::default();
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let data = encode(record)?;
        let (rows, id, expires_at) = (
            self.rows.clone(),
            record.id.to_string(),
            record.expiry_date.unix_timestamp(),
        );
        run(move || rows.save(&id, &data, expires_at)).await
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        let (rows, id) = (self.rows.clone(), id.to_string());
        let Some(data) = run(move || rows.load(&id, now())).await? else {
            return Ok(None);
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|e| session_store::Error::Decode(e.to_string()))
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        let (rows, id) = (self.rows.clone(), id.to_string());
        run(move || rows.delete(&id)).await
    }
}

#[async_trait]
impl ExpiredDeletion for SqliteSessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let rows = self.rows.clone();
        run(move || rows.delete_expired(now())).await?;
        Ok(())
    }
}

/// Sweeps expired sessions every `period` until the task is dropped.
pub async fn run_sweep_loop(store: SqliteSessionStore, period: Duration) {
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;

        if let Err(e) = store.delete_expired().await {
            warn!("Session sweep failed: {}", e);
        }
    }
}
