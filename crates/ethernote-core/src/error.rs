//! Error types for ethernote-core

use thiserror::Error;

use crate::controller::Operation;
use crate::state::NoteMode;
use crate::store::StoreError;

/// Result type alias using ethernote-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by controllers and configuration.
///
/// Cloneable so the last failure can be kept in a state snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Local validation failed; nothing was sent to the store
    #[error("Validation error: {0}")]
    Validation(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Store unreachable or returned a server error
    #[error("Network failure: {0}")]
    Network(String),

    /// Another network operation is still in flight on this controller
    #[error("Cannot {0} while another operation is in progress")]
    Busy(Operation),

    /// Intent is not valid in the current mode
    #[error("Cannot {operation} while {mode}")]
    InvalidState { operation: Operation, mode: NoteMode },

    /// A newer request replaced this one before it resolved
    #[error("Request superseded by a newer one")]
    Superseded,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Network(other.to_string()),
        }
    }
}
