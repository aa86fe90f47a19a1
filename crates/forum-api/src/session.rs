use tower_sessions::Session;

use crate::error::AppError;

const AUTHENTICATED_USER_ID: &str = "authenticated_user_id";
const FLASH: &str = "flash";

/// Id of the logged-in user, inserted into request extensions by
/// [`require_auth`](crate::middleware::require_auth).
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

pub async fn authenticated_user(session: &Session) -> Result<Option<i64>, AppError> {
    Ok(session.get::<i64>(AUTHENTICATED_USER_ID).await?)
}

/// Marks the session as logged in. The session id is rotated first so a
/// pre-login id cannot be reused.
pub async fn log_in(session: &Session, user_id: i64) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.insert(AUTHENTICATED_USER_ID, user_id).await?;
    Ok(())
}

pub async fn log_out(session: &Session) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.remove::<i64>(AUTHENTICATED_USER_ID).await?;
    Ok(())
}

pub async fn put_flash(session: &Session, message: &str) -> Result<(), AppError> {
    session.insert(FLASH, message).await?;
    Ok(())
}

/// Returns the flash message, if any, and clears it.
pub async fn pop_flash(session: &Session) -> Result<Option<String>, AppError> {
    Ok(session.remove::<String>(FLASH).await?)
}
