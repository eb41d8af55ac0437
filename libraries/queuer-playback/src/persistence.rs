//! Saved queues
//!
//! Only the retained subset of each song is stored: ID, title, some metadata
//! and the provider descriptor. Attached streams, votes and pause state are
//! never saved. Loading builds fresh songs from the descriptors and queues
//! them through the normal add path.
//!
//! A queue can be saved three ways:
//! - **Personal**: belongs to the owner, loadable anywhere
//! - **Session**: belongs to the session, any member can load it
//! - **SessionPersonal**: belongs to the owner, loadable only in that session

use crate::{
    error::{QueueError, Result},
    handle::QueueHandle,
    types::AddOptions,
};
use async_trait::async_trait;
use queuer_core::{ProviderDescriptor, RequesterId, SessionId, Song, SongId, SongMetadata};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Where a saved queue lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveLocation {
    Personal,
    Session,
    SessionPersonal,
}

/// How `find_saved` matched a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoundVia {
    /// The name was itself a storage key
    ShareKey,
    /// The name hashed to a key at this location
    Location(SaveLocation),
}

/// Retained fields of one song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSong {
    pub id: SongId,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub added_by: Option<RequesterId>,
    pub provider: ProviderDescriptor,
}

impl From<&Song> for SavedSong {
    fn from(song: &Song) -> Self {
        let metadata = song.metadata();
        Self {
            id: song.id().clone(),
            title: song.title().to_string(),
            artist: metadata.artist.clone(),
            album: metadata.album.clone(),
            duration_ms: metadata
                .duration
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            year: metadata.year,
            added_by: metadata.added_by.clone(),
            provider: song.provider().clone(),
        }
    }
}

impl SavedSong {
    /// Build a fresh song (new ID) from the saved fields
    pub fn to_song(&self) -> Song {
        Song::new(self.title.clone(), self.provider.clone()).with_metadata(SongMetadata {
            artist: self.artist.clone(),
            album: self.album.clone(),
            duration: self.duration_ms.map(Duration::from_millis),
            year: self.year,
            added_by: self.added_by.clone(),
        })
    }
}

/// A saved queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQueue {
    /// Lower-cased save name
    pub name: String,
    /// Who saved it
    pub owner: RequesterId,
    /// Session it was saved from, if any
    #[serde(default)]
    pub session: Option<SessionId>,
    pub location: SaveLocation,
    pub songs: Vec<SavedSong>,
}

impl SavedQueue {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| QueueError::Collaborator(e.into()))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|e| QueueError::Collaborator(e.into()))
    }
}

/// Storage key for a saved queue name at a location
///
/// SHA-256 (hex) of the lower-cased name combined with the owner and/or
/// session. Session locations need a session.
pub fn storage_key(
    name: &str,
    location: SaveLocation,
    owner: &RequesterId,
    session: Option<&SessionId>,
) -> Result<String> {
    let name = normalize_name(name)?;
    let material = match (location, session) {
        (SaveLocation::Personal, _) => format!("{name}{owner}"),
        (SaveLocation::Session, Some(session)) => format!("{name}{session}"),
        (SaveLocation::SessionPersonal, Some(session)) => format!("{session}{owner}{name}"),
        (SaveLocation::Session | SaveLocation::SessionPersonal, None) => {
            return Err(QueueError::invalid(format!(
                "saving to {location:?} needs a session"
            )))
        }
    };
    Ok(format!("{:x}", Sha256::digest(material.as_bytes())))
}

fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(QueueError::invalid("saved queue name is empty"));
    }
    Ok(name)
}

/// Durable storage for saved queues
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn get(&self, key: &str) -> queuer_core::Result<Option<SavedQueue>>;

    async fn put(&self, key: &str, queue: SavedQueue) -> queuer_core::Result<()>;

    /// Returns whether something was deleted
    async fn delete(&self, key: &str) -> queuer_core::Result<bool>;
}

/// In-memory store (lives as long as the process)
#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    queues: RwLock<HashMap<String, SavedQueue>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.queues.read().await.len()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn get(&self, key: &str) -> queuer_core::Result<Option<SavedQueue>> {
        Ok(self.queues.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, queue: SavedQueue) -> queuer_core::Result<()> {
        self.queues.write().await.insert(key.to_string(), queue);
        Ok(())
    }

    async fn delete(&self, key: &str) -> queuer_core::Result<bool> {
        Ok(self.queues.write().await.remove(key).is_some())
    }
}

/// A saved queue and where it was found
#[derive(Debug, Clone, PartialEq)]
pub struct FoundQueue {
    pub key: String,
    pub via: FoundVia,
    pub queue: SavedQueue,
}

/// Save a queue's songs under `name`; returns the storage key
pub async fn save_queue(
    store: &dyn QueueStore,
    handle: &QueueHandle,
    name: &str,
    owner: &RequesterId,
    session: Option<&SessionId>,
    location: SaveLocation,
) -> Result<String> {
    let key = storage_key(name, location, owner, session)?;
    let snapshot = handle.snapshot().await?;

    let saved = SavedQueue {
        name: normalize_name(name)?,
        owner: owner.clone(),
        session: session.cloned(),
        location,
        songs: snapshot.songs.iter().map(SavedSong::from).collect(),
    };
    let count = saved.songs.len();
    store.put(&key, saved).await?;

    info!(queue = %handle.id(), ?location, songs = count, "Saved queue");
    Ok(key)
}

/// Look a saved queue up by name
///
/// Tries the name as a raw share key, then the personal, session and
/// session-personal keys.
pub async fn find_saved(
    store: &dyn QueueStore,
    name: &str,
    owner: &RequesterId,
    session: Option<&SessionId>,
) -> Result<Option<FoundQueue>> {
    if let Some(queue) = store.get(name).await? {
        return Ok(Some(FoundQueue {
            key: name.to_string(),
            via: FoundVia::ShareKey,
            queue,
        }));
    }

    let mut locations = vec![SaveLocation::Personal];
    if session.is_some() {
        locations.push(SaveLocation::Session);
        locations.push(SaveLocation::SessionPersonal);
    }

    for location in locations {
        let key = storage_key(name, location, owner, session)?;
        if let Some(queue) = store.get(&key).await? {
            debug!(?location, "Found saved queue");
            return Ok(Some(FoundQueue {
                key,
                via: FoundVia::Location(location),
                queue,
            }));
        }
    }
    Ok(None)
}

/// Delete a saved queue found by name; returns whether one was deleted
pub async fn delete_saved(
    store: &dyn QueueStore,
    name: &str,
    owner: &RequesterId,
    session: Option<&SessionId>,
) -> Result<bool> {
    match find_saved(store, name, owner, session).await? {
        Some(found) => Ok(store.delete(&found.key).await?),
        None => Ok(false),
    }
}

/// Queue every song of a saved queue; returns the songs added
///
/// Songs that cannot be added (bad descriptor) are skipped.
pub async fn load_saved_queue(handle: &QueueHandle, saved: &SavedQueue) -> Result<Vec<Song>> {
    let mut added = Vec::with_capacity(saved.songs.len());

    for saved_song in &saved.songs {
        match handle.add(saved_song.to_song(), AddOptions::default()).await {
            Ok(song) => added.push(song),
            Err(QueueError::AlreadyDestroyed) => return Err(QueueError::AlreadyDestroyed),
            Err(e) => {
                warn!(queue = %handle.id(), title = %saved_song.title, error = %e, "Skipping saved song");
            }
        }
    }

    info!(queue = %handle.id(), songs = added.len(), "Loaded saved queue");
    Ok(added)
}
