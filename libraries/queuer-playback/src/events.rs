//! Queue Events
//!
//! Published on a broadcast channel so any number of observers (status
//! renderers, the registry, tests) can follow a queue:
//! - Playback transitions (play, pause, next, previous)
//! - End-of-song handling (repeat, loop, finish)
//! - Membership changes (removed) and the terminal destroyed notification

use queuer_core::{QueueId, Song};
use serde::{Deserialize, Serialize};

/// Events emitted by a queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueueEvent {
    /// A song started or resumed
    Play {
        /// Emitting queue
        queue: QueueId,
        /// The song now playing
        song: Song,
    },

    /// Playback paused
    Pause {
        /// Emitting queue
        queue: QueueId,
        /// The song paused at, if any
        song: Option<Song>,
    },

    /// Advanced to the following song
    Next {
        /// Emitting queue
        queue: QueueId,
        /// Song that was current before
        previous: Option<Song>,
        /// Song now playing
        next: Song,
    },

    /// Went back to an earlier song
    Previous {
        /// Emitting queue
        queue: QueueId,
        /// Song that was current before
        current: Option<Song>,
        /// Song now playing
        previous: Song,
    },

    /// Wrapped from the end of the queue to the first song
    Loop {
        /// Emitting queue
        queue: QueueId,
        /// First song, now playing
        song: Song,
    },

    /// The current song finished and is playing again
    Repeat {
        /// Emitting queue
        queue: QueueId,
        /// The repeated song
        song: Song,
    },

    /// The queue ran out of songs
    Finish {
        /// Emitting queue
        queue: QueueId,
        /// Last song played
        last: Option<Song>,
    },

    /// A song left the queue
    Removed {
        /// Emitting queue
        queue: QueueId,
        /// The removed song
        song: Song,
    },

    /// The queue was destroyed; no further events follow
    Destroyed {
        /// Emitting queue
        queue: QueueId,
    },
}

impl QueueEvent {
    /// The queue that emitted this event
    pub fn queue_id(&self) -> QueueId {
        match self {
            Self::Play { queue, .. }
            | Self::Pause { queue, .. }
            | Self::Next { queue, .. }
            | Self::Previous { queue, .. }
            | Self::Loop { queue, .. }
            | Self::Repeat { queue, .. }
            | Self::Finish { queue, .. }
            | Self::Removed { queue, .. }
            | Self::Destroyed { queue } => *queue,
        }
    }

    /// Short event name (`"play"`, `"next"`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Play { .. } => "play",
            Self::Pause { .. } => "pause",
            Self::Next { .. } => "next",
            Self::Previous { .. } => "previous",
            Self::Loop { .. } => "loop",
            Self::Repeat { .. } => "repeat",
            Self::Finish { .. } => "finish",
            Self::Removed { .. } => "removed",
            Self::Destroyed { .. } => "destroyed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Destroyed { .. })
    }
}
