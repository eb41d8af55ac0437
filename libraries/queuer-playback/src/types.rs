//! Core types for queue management

use crate::error::QueueError;
use queuer_core::{QueueId, RequesterId, Song, SongId};
use serde::{Deserialize, Serialize};

/// Stable arena handle for a song inside one queue
///
/// Assigned in insertion order and never reused, so sorting slots restores
/// insertion order.
pub type Slot = usize;

/// Ways of pointing at a song in a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SongRef {
    /// A song by its ID (reverse lookup of its play position)
    Id(SongId),

    /// An arena slot
    Slot(Slot),

    /// A play position (0-based rank in the play order)
    Position(usize),

    /// First song (in play order) whose title matches exactly
    Title(String),
}

impl From<&Song> for SongRef {
    fn from(song: &Song) -> Self {
        Self::Id(song.id().clone())
    }
}

impl From<SongId> for SongRef {
    fn from(id: SongId) -> Self {
        Self::Id(id)
    }
}

impl From<usize> for SongRef {
    fn from(position: usize) -> Self {
        Self::Position(position)
    }
}

impl From<&str> for SongRef {
    fn from(title: &str) -> Self {
        Self::Title(title.to_string())
    }
}

/// Repeat mode
///
/// Cycles `Off -> Queue -> Song -> Off`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Stop when the queue ends
    #[default]
    Off,

    /// Wrap to the first song at the end of the queue
    Queue,

    /// Replay the current song when it finishes
    Song,
}

impl RepeatMode {
    /// The next mode in the toggle cycle
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::Queue,
            Self::Queue => Self::Song,
            Self::Song => Self::Off,
        }
    }

    /// Mode for a numeric level, clamped to `0..=2`
    pub fn from_level(level: i64) -> Self {
        match level {
            i64::MIN..=0 => Self::Off,
            1 => Self::Queue,
            _ => Self::Song,
        }
    }

    /// Numeric level (0 = off, 1 = queue, 2 = song)
    pub fn level(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Queue => 1,
            Self::Song => 2,
        }
    }
}

/// Why a queue is paused
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseReason {
    /// Not paused
    #[default]
    NotPaused,

    /// Someone asked for a pause
    UserRequest,

    /// The sink paused itself (e.g. nobody listening)
    LostFocus,

    /// Playback was stopped and the transport released
    Stopped,

    /// The last song finished and nothing follows
    EndOfQueue,

    /// The transport connection dropped
    Disconnected,
}

/// What shuffling does with the current song
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShufflePolicy {
    /// Permute the whole order; the current song keeps playing wherever it lands
    #[default]
    InPlace,

    /// Move the current song to position 0, then permute the rest
    CurrentToFront,
}

/// How `move_song` places a song relative to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveMode {
    /// Place directly after the anchor
    After,

    /// Place directly before the anchor
    Before,

    /// Exchange the two positions
    Swap,
}

impl TryFrom<u8> for MoveMode {
    type Error = QueueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::After),
            1 => Ok(Self::Before),
            2 => Ok(Self::Swap),
            other => Err(QueueError::invalid(format!("unknown move mode {other}"))),
        }
    }
}

/// Where `add` inserts a song
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Play position to insert at (ignored when out of range)
    pub index: Option<usize>,

    /// Insert right after the current song (wins over `index`)
    pub next_in_queue: bool,
}

impl AddOptions {
    /// Insert right after the current song
    pub fn next_in_queue() -> Self {
        Self {
            index: None,
            next_in_queue: true,
        }
    }

    /// Insert at a play position
    pub fn at(index: usize) -> Self {
        Self {
            index: Some(index),
            next_in_queue: false,
        }
    }
}

/// Collective request kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteKind {
    /// Skip to the next song
    Next,

    /// Go back to the previous song
    Previous,
}

/// Result of casting a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOutcome {
    /// The requester is not listening at the destination
    Ignored,

    /// Counted, threshold not reached yet
    Recorded {
        /// Distinct requesters counted so far
        votes: usize,
        /// Votes needed to trigger
        required: usize,
    },

    /// Threshold crossed; the action ran
    Triggered,
}

/// Coarse playback state of a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueStatus {
    /// No live transport connection
    Disconnected,

    /// Connected, no songs
    Empty,

    /// Connected with songs, nothing attached and not paused
    Idle,

    /// A song is attached and playing
    Playing,

    /// Paused for the given reason
    Paused(PauseReason),

    /// The queue was destroyed
    Destroyed,
}

/// Read-only view of a queue, captured in one step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSnapshot {
    /// Queue ID
    pub id: QueueId,

    /// Who created the queue
    pub author: Option<RequesterId>,

    /// Songs in play order
    pub songs: Vec<Song>,

    /// Head position (meaningful only when `songs` is non-empty)
    pub head: usize,

    /// Song at the head position
    pub current: Option<Song>,

    /// Whether playback is paused
    pub paused: bool,

    /// Why playback is paused
    pub pause_reason: PauseReason,

    /// Repeat mode
    pub repeat: RepeatMode,

    /// Whether shuffle is on
    pub shuffle: bool,

    /// Coarse status
    pub status: QueueStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_cycle_returns_to_off() {
        let mode = RepeatMode::Off;
        assert_eq!(mode.cycle(), RepeatMode::Queue);
        assert_eq!(mode.cycle().cycle(), RepeatMode::Song);
        assert_eq!(mode.cycle().cycle().cycle(), RepeatMode::Off);
    }

    #[test]
    fn repeat_level_clamps() {
        assert_eq!(RepeatMode::from_level(-4), RepeatMode::Off);
        assert_eq!(RepeatMode::from_level(1), RepeatMode::Queue);
        assert_eq!(RepeatMode::from_level(9), RepeatMode::Song);
        assert_eq!(RepeatMode::Song.level(), 2);
    }

    #[test]
    fn move_mode_from_number() {
        assert_eq!(MoveMode::try_from(0).unwrap(), MoveMode::After);
        assert_eq!(MoveMode::try_from(1).unwrap(), MoveMode::Before);
        assert_eq!(MoveMode::try_from(2).unwrap(), MoveMode::Swap);
        assert!(matches!(
            MoveMode::try_from(3),
            Err(QueueError::InvalidArgument(_))
        ));
    }

    #[test]
    fn add_option_shortcuts() {
        assert!(AddOptions::next_in_queue().next_in_queue);
        assert_eq!(AddOptions::at(2).index, Some(2));
        assert_eq!(AddOptions::default(), AddOptions { index: None, next_in_queue: false });
    }
}
