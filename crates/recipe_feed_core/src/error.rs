//! crates/recipe_feed_core/src/error.rs
//!
//! The single error type every engine operation fails with.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A referenced user, recipe or review does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// The request is malformed: bad rating, page bounds, sort key, self-follow.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The caller does not own the resource it tried to change.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    /// The store failed; nothing the caller can correct.
    #[error("Storage failure: {0}")]
    Storage(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<PortError> for CoreError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => CoreError::NotFound(what),
            PortError::Conflict(what) => CoreError::Conflict(what),
            PortError::Unexpected(what) => CoreError::Storage(what),
        }
    }
}
