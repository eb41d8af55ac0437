//! Song (queue item) record

use crate::error::{QueuerError, Result};
use crate::types::ids::{QueueId, RequesterId, SongId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider method used when a descriptor names none (or names one the
/// owner never registered)
pub const DEFAULT_PROVIDER_METHOD: &str = "play_song";

/// Descriptive metadata for a song
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMetadata {
    /// Artist name
    #[serde(default)]
    pub artist: String,

    /// Album the song belongs to
    #[serde(default)]
    pub album: Option<String>,

    /// Song duration
    #[serde(default)]
    pub duration: Option<Duration>,

    /// Release year
    #[serde(default)]
    pub year: Option<u16>,

    /// Who added the song
    #[serde(default)]
    pub added_by: Option<RequesterId>,
}

/// Enough information for an external resolver to fetch a stream for a song
///
/// The queue never interprets `persistent_data`; it is kept with the song and
/// handed back to the owning provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Identifier of the component that created the song
    pub owner_id: String,

    /// Name of the owner's method that produces stream data
    #[serde(default)]
    pub method_name: String,

    /// Opaque owner data (source URL, description, ...)
    #[serde(default)]
    pub persistent_data: serde_json::Value,
}

impl ProviderDescriptor {
    /// Create a descriptor for an owner and method
    pub fn new(owner_id: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            method_name: method_name.into(),
            persistent_data: serde_json::Value::Null,
        }
    }

    /// Attach opaque owner data
    #[must_use]
    pub fn with_persistent_data(mut self, data: serde_json::Value) -> Self {
        self.persistent_data = data;
        self
    }

    /// The method to call, with whitespace stripped and the default applied
    pub fn method(&self) -> String {
        let method: String = self
            .method_name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        if method.is_empty() {
            DEFAULT_PROVIDER_METHOD.to_string()
        } else {
            method
        }
    }

    /// Check that the descriptor can be resolved at all
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(QueuerError::invalid_input(
                "provider descriptor has no owner id",
            ));
        }
        Ok(())
    }
}

/// One playable item
///
/// Descriptive fields are fixed once the song is built. The only mutable
/// state is the owning-queue back reference, which the queue sets when the
/// song is added and clears when it is removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    id: SongId,
    title: String,
    #[serde(default)]
    metadata: SongMetadata,
    provider: ProviderDescriptor,
    #[serde(default)]
    temporary: bool,
    #[serde(skip)]
    queue: Option<QueueId>,
}

impl Song {
    /// Create a new song with a fresh ID
    pub fn new(title: impl Into<String>, provider: ProviderDescriptor) -> Self {
        Self {
            id: SongId::generate(),
            title: title.into(),
            metadata: SongMetadata::default(),
            provider,
            temporary: false,
            queue: None,
        }
    }

    /// Use a specific ID instead of a generated one
    #[must_use]
    pub fn with_id(mut self, id: SongId) -> Self {
        self.id = id;
        self
    }

    /// Set descriptive metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: SongMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Mark the song as temporary (removed after it has played once)
    #[must_use]
    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    pub fn id(&self) -> &SongId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn metadata(&self) -> &SongMetadata {
        &self.metadata
    }

    pub fn provider(&self) -> &ProviderDescriptor {
        &self.provider
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// The queue that currently owns this song, if any
    pub fn queue(&self) -> Option<QueueId> {
        self.queue
    }

    /// Record (or clear) the owning queue
    ///
    /// Only the owning queue calls this.
    pub fn set_queue(&mut self, queue: Option<QueueId>) {
        self.queue = queue;
    }

    /// Validate the song before it is queued
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(QueuerError::invalid_input("song has no title"));
        }
        self.provider.validate()
    }

    /// Serialize to JSON (the owning queue is never included)
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load a song from its JSON form
    pub fn from_json(data: &str) -> Result<Self> {
        let song: Song = serde_json::from_str(data)?;
        song.validate()?;
        Ok(song)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ProviderDescriptor {
        ProviderDescriptor::new("com.example.tube", "fetch_stream")
    }

    #[test]
    fn method_defaults_when_blank() {
        let blank = ProviderDescriptor::new("owner", "  ");
        assert_eq!(blank.method(), DEFAULT_PROVIDER_METHOD);

        let spaced = ProviderDescriptor::new("owner", "fetch stream");
        assert_eq!(spaced.method(), "fetchstream");
    }

    #[test]
    fn descriptor_without_owner_is_invalid() {
        let song = Song::new("Title", ProviderDescriptor::new("", "x"));
        assert!(matches!(
            song.validate(),
            Err(QueuerError::InvalidInput(_))
        ));
    }

    #[test]
    fn json_round_trip_drops_queue_owner() {
        let mut song = Song::new("Song A", descriptor())
            .with_metadata(SongMetadata {
                artist: "Artist".to_string(),
                year: Some(1999),
                ..SongMetadata::default()
            })
            .temporary(true);
        song.set_queue(Some(QueueId::generate()));

        let json = song.to_json().unwrap();
        let back = Song::from_json(&json).unwrap();

        assert_eq!(back.id(), song.id());
        assert_eq!(back.metadata().year, Some(1999));
        assert!(back.is_temporary());
        assert_eq!(back.queue(), None);
    }

    #[test]
    fn from_json_rejects_missing_owner() {
        let json = r#"{"id":"1","title":"T","provider":{"owner_id":""}}"#;
        assert!(Song::from_json(json).is_err());
    }
}
