/// Collaborator traits for Queuer
use crate::error::Result;
use crate::types::{RequesterId, Song, StreamData};
use async_trait::async_trait;

/// Playback transport (the connection that actually plays audio)
///
/// A queue drives exactly one transport. Lifecycle signals flow back the other
/// way as [`SinkSignal`](crate::types::SinkSignal)s, delivered through the
/// queue's signal sender.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Ensure the destination connection is up
    ///
    /// # Errors
    /// Returns an error when the destination cannot be reached
    async fn connect(&self) -> Result<()>;

    /// Whether a live connection currently exists
    fn is_connected(&self) -> bool;

    /// Start playing `data` for `song`, replacing whatever was attached
    async fn attach(&self, song: &Song, data: StreamData) -> Result<()>;

    /// Pause the attached stream
    async fn pause(&self) -> Result<()>;

    /// Resume the attached stream
    async fn resume(&self) -> Result<()>;

    /// Stop the attached stream and drop it
    async fn stop(&self) -> Result<()>;

    /// Close the connection
    async fn disconnect(&self) -> Result<()>;

    /// Toggle the "speaking" indicator on the destination
    fn set_speaking(&self, speaking: bool) {
        let _ = speaking;
    }

    /// Requesters currently present at the destination (the voting electorate)
    fn participants(&self) -> Vec<RequesterId>;
}

/// Produces stream data for songs owned by one component
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Fetch stream data for `song`
    ///
    /// `Ok(None)` means the provider has nothing to play for this song.
    async fn stream_data(&self, song: &Song) -> Result<Option<StreamData>>;
}
