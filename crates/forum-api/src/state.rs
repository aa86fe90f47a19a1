use std::sync::Arc;

use forum_db::{Database, MessageStore, SessionRows, ThreadStore, UserStore};

use crate::error::AppError;
use crate::session_store::SqliteSessionStore;

/// Dependencies shared by every handler. Built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub threads: ThreadStore,
    pub messages: MessageStore,
    pub sessions: SqliteSessionStore,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            users: UserStore::new(db.clone()),
            threads: ThreadStore::new(db.clone()),
            messages: MessageStore::new(db.clone()),
            sessions: SqliteSessionStore::new(SessionRows::new(db)),
        }
    }
}

/// Runs a blocking store call off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> forum_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}
