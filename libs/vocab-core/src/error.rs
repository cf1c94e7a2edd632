//! Error types for vocab-core.

use thiserror::Error;

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the scoring and scheduling core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid interval {value}: expected a whole number of days between 1 and 365")]
    InvalidInterval { value: String },

    #[error("unparseable date {value:?}: expected DD/MM/YYYY")]
    UnparseableDate { value: String },

    #[error("date {value} cannot be moved further forward")]
    DateOutOfRange { value: String },

    #[error("card id space exhausted")]
    IdsExhausted,

    #[error("no cards due: nothing to do")]
    EmptyDeck,

    #[error("unknown difficulty tier {0:?}")]
    UnknownTier(String),
}
