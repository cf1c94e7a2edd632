//! Database error types.

use thiserror::Error;
use vocab_core::CoreError;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("attempt history encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
