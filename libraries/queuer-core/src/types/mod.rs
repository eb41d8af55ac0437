mod ids;
mod song;
mod stream;

pub use ids::{DestinationId, QueueId, RequesterId, SessionId, SongId};
pub use song::{ProviderDescriptor, Song, SongMetadata, DEFAULT_PROVIDER_METHOD};
pub use stream::{SinkSignal, StreamData};
