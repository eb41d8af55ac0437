//! Queuer - Playback Queues
//!
//! Ordered playback queues for many independent sessions, each bound to one
//! playback destination.
//!
//! This crate provides:
//! - Song arena with a separate play order (stable slots, logical delete)
//! - Playback state machine (play, pause, next, previous, stop, destroy)
//! - Shuffle (Fisher-Yates, reversible to insertion order)
//! - Repeat modes (Off, Queue, Song)
//! - Skip / go-back votes with a participant threshold
//! - Add / remove / move while playback is live
//! - One tokio task per queue, fed by user commands and sink signals
//! - Registry with multi-key lookup, and saved queues
//!
//! # Architecture
//!
//! `queuer-playback` never streams audio itself:
//! - The [`Transport`](queuer_core::Transport) trait plays, pauses and stops
//! - [`StreamProvider`](queuer_core::StreamProvider)s turn songs into stream data
//! - Lifecycle signals come back through a [`SignalSender`]
//!
//! # Example: Running a Queue
//!
//! ```rust,no_run
//! use queuer_core::{ProviderRegistry, Transport};
//! use queuer_playback::{AddOptions, Queue, QueueConfig, QueueHandle};
//! use std::sync::Arc;
//!
//! # async fn example(transport: Arc<dyn Transport>, song: queuer_core::Song) -> queuer_playback::Result<()> {
//! let queue = Queue::new(QueueConfig::default(), transport, Arc::new(ProviderRegistry::new()));
//! let handle = QueueHandle::spawn(queue);
//! let mut events = handle.subscribe();
//!
//! // The first song starts playing on its own
//! handle.add(song, AddOptions::default()).await?;
//! let first = events.recv().await;
//!
//! handle.shuffle(Some(true)).await?;
//! handle.repeat(None).await?;
//! handle.next(None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Registry
//!
//! ```rust,no_run
//! use queuer_core::{DestinationId, ProviderRegistry, RequesterId, Transport};
//! use queuer_playback::{QueueConfig, QueueLookup, QueueRegistry};
//! use std::sync::Arc;
//!
//! # async fn example(transport: Arc<dyn Transport>) -> queuer_playback::Result<()> {
//! let registry = QueueRegistry::new(QueueConfig::default(), ProviderRegistry::new());
//! let handle = registry
//!     .create(DestinationId::new("room-1"), None, transport, None)
//!     .await?;
//!
//! let found = registry
//!     .find(&QueueLookup::by_requester(RequesterId::new("alice")))
//!     .await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod config;
mod error;
mod events;
mod handle;
mod manager;
pub mod persistence;
mod registry;
mod shuffle;
mod tracklist;
pub mod types;
mod votes;

// Public exports
pub use config::{QueueConfig, QueuerConfig};
pub use error::{QueueError, Result};
pub use events::QueueEvent;
pub use handle::{QueueHandle, SignalSender};
pub use manager::{Queue, RetryAfter};
pub use registry::{QueueLookup, QueueRegistry};
pub use shuffle::{fisher_yates, shuffle_order, unshuffle_order};
pub use tracklist::Tracklist;
pub use types::{
    AddOptions, MoveMode, PauseReason, QueueSnapshot, QueueStatus, RepeatMode, ShufflePolicy,
    Slot, SongRef, VoteKind, VoteOutcome,
};
pub use votes::VoteBox;
