/// Core error types for Queuer
use thiserror::Error;

/// Result type alias using `QueuerError`
pub type Result<T> = std::result::Result<T, QueuerError>;

/// Errors raised by Queuer collaborators (transports, providers, storage)
#[derive(Error, Debug)]
pub enum QueuerError {
    /// The playback transport failed (connect, attach, pause, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A stream provider failed to produce data
    #[error("Provider error: {0}")]
    Provider(String),

    /// Saved queue storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl QueuerError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
