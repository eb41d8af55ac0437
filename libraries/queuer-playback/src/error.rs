//! Error types for queue operations

use queuer_core::{QueuerError, SongId};
use thiserror::Error;

/// Queue errors
#[derive(Debug, Error)]
pub enum QueueError {
    /// The transport is unavailable and reconnecting failed
    #[error("No active connection: {0}")]
    NoActiveConnection(String),

    /// An identifier did not resolve where a song was required
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// The song's provider produced no stream data
    #[error("Item not playable: {0}")]
    ItemNotPlayable(SongId),

    /// Wrong shape for an identifier, index, mode or song
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The queue has been destroyed
    #[error("Queue already destroyed")]
    AlreadyDestroyed,

    /// A collaborator (transport, storage) failed
    #[error(transparent)]
    Collaborator(#[from] QueuerError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueueError {
    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        Self::ItemNotFound(what.to_string())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;
