use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use forum_db::StoreError;
use thiserror::Error;
use tracing::error;

/// Errors a handler can bail out with. Validation failures never end up
/// here; they re-render the form instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound | Self::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "Not Found").into_response()
            }
            // Logged inside the request span, which carries method and URI.
            other => {
                error!(error = %other, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
