//! Queuer Core
//!
//! Shared types, collaborator traits, and error handling for Queuer playback
//! queues.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Song`, `ProviderDescriptor`, `StreamData`, `SinkSignal`
//! - **Collaborator Traits**: `Transport`, `StreamProvider`
//! - **Provider Lookup**: `ProviderRegistry`
//! - **Error Handling**: `QueuerError` and `Result`
//!
//! # Example
//!
//! ```rust
//! use queuer_core::types::{ProviderDescriptor, Song, SongMetadata};
//!
//! let song = Song::new("Intro", ProviderDescriptor::new("com.example.tube", "play_song"))
//!     .with_metadata(SongMetadata {
//!         artist: "Someone".to_string(),
//!         ..SongMetadata::default()
//!     });
//!
//! assert!(song.validate().is_ok());
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod providers;
pub mod traits;
pub mod types;

pub use error::{QueuerError, Result};
pub use providers::ProviderRegistry;
pub use traits::{StreamProvider, Transport};
pub use types::{
    DestinationId, ProviderDescriptor, QueueId, RequesterId, SessionId, SinkSignal, Song, SongId,
    SongMetadata, StreamData, DEFAULT_PROVIDER_METHOD,
};
