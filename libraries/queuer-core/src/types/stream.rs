//! Stream data and sink lifecycle signals

use crate::types::ids::SongId;
use std::path::PathBuf;
use std::sync::Arc;

/// Streamable data for one song, produced by its provider
///
/// Handed to the transport as-is; the queue only caches it while the song is
/// the one currently playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamData {
    /// Remote stream location
    Url(String),

    /// Local file
    File(PathBuf),

    /// Fully buffered encoded audio
    Buffer(Arc<[u8]>),
}

/// Lifecycle signals delivered by the transport to the owning queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkSignal {
    /// The attached song finished playing
    Idle { song: SongId },

    /// Playback of the attached song failed
    Error { song: SongId, message: String },

    /// The sink paused on its own (e.g. nobody is listening)
    AutoPaused,

    /// The sink may play again after an automatic pause
    FocusRegained,

    /// The sink reports it is playing
    Playing,

    /// The connection to the destination dropped
    Disconnected,
}

impl SinkSignal {
    /// The song a signal refers to, for signals tied to one song
    pub fn song(&self) -> Option<&SongId> {
        match self {
            Self::Idle { song } | Self::Error { song, .. } => Some(song),
            Self::AutoPaused | Self::FocusRegained | Self::Playing | Self::Disconnected => None,
        }
    }
}
