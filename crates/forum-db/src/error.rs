use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures surfaced by the stores.
///
/// `NotFound`, `DuplicateEmail` and `InvalidCredentials` are expected
/// outcomes the caller is meant to handle; everything else is internal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no matching record found")]
    NotFound,

    #[error("email address is already in use")]
    DuplicateEmail,

    /// Unknown email or wrong password. The two cases are deliberately
    /// not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection lock poisoned: {0}")]
    Poisoned(String),
}

impl StoreError {
    /// Whether the error is an unexpected failure rather than a
    /// domain outcome.
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            Self::NotFound | Self::DuplicateEmail | Self::InvalidCredentials
        )
    }
}
