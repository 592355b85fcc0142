//! Engine error types.

use thiserror::Error;
use tutor_core::{BackendError, FailureKind};

/// Errors that can occur while processing a turn.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Profile load/save failed.
    #[error("database error: {0}")]
    Database(#[from] database::DatabaseError),

    /// A chat/transcription/speech call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// An outbound transport operation failed.
    #[error("transport error: {0}")]
    Transport(String),
}

impl EngineError {
    /// Classify this error for the property tests and logs.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Database(_) | Self::Transport(_) => FailureKind::TransientIo,
            Self::Backend(_) => FailureKind::Backend,
        }
    }
}
