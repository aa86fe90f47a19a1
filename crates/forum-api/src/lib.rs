pub mod account;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod session_store;
pub mod state;
pub mod templates;
pub mod threads;
pub mod validator;

pub use error::AppError;
pub use routes::{WebConfig, app};
pub use session_store::{SWEEP_INTERVAL, SqliteSessionStore, run_sweep_loop};
pub use state::AppState;

/// Parses a positive id from a path segment. Anything else is treated as
/// a page that does not exist.
pub(crate) fn parse_id(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("7").unwrap(), 7);
        for bad in ["0", "-3", "abc", "", "1.5", "99999999999999999999"] {
            assert!(matches!(parse_id(bad), Err(AppError::NotFound)), "{bad}");
        }
    }
}
