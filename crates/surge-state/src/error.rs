//! Error types for the capacity history store.

use thiserror::Error;

pub type StateResult<T> = Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open history database: {0}")]
    Open(String),

    /// Any redb transaction, table, or storage failure.
    /// Another process (usually `surged run`) holds the database file.
    #[error("history database {0} is locked by another process")]
    Locked(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("history record codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The backing store cannot be reached (lock poisoned, disk gone, ...).
    #[error("history store unavailable: {0}")]
    Unavailable(String),
}
