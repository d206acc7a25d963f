//! Common error types for Raesonic

use thiserror::Error;

/// Common result type for Raesonic operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Raesonic services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for SQLite lock contention that a fresh attempt may get past
    ///
    /// Covers `SQLITE_BUSY` and its extended codes (e.g. `SQLITE_BUSY_SNAPSHOT`
    /// when a WAL read snapshot went stale before a write) as well as
    /// `SQLITE_LOCKED`.
    pub fn is_lock_contention(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => {
                let primary = db_err
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| code & 0xff);
                matches!(primary, Some(5) | Some(6))
                    || db_err.message().contains("database is locked")
            }
            _ => false,
        }
    }
}
