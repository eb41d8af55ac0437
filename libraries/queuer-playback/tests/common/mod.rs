//! Shared fakes and helpers for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use queuer_core::{
    ProviderDescriptor, ProviderRegistry, QueuerError, RequesterId, Song, SongId, StreamData,
    StreamProvider, Transport,
};
use queuer_playback::{AddOptions, Queue, QueueConfig, QueueEvent};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use tokio::sync::broadcast;

static INIT: Once = Once::new();

pub const OWNER: &str = "test.provider";

/// Initialize logging once per test binary
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Transport calls, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    Attach(String),
    Pause,
    Resume,
    Stop,
    Disconnect,
}

/// Transport that records every call
#[derive(Debug, Default)]
pub struct FakeTransport {
    connected: AtomicBool,
    refuse_connect: AtomicBool,
    speaking: AtomicBool,
    participants: Mutex<Vec<RequesterId>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_participants(names: &[&str]) -> Arc<Self> {
        let transport = Self::default();
        transport.set_participants(names);
        Arc::new(transport)
    }

    pub fn set_participants(&self, names: &[&str]) {
        *self.participants.lock().unwrap() = names.iter().map(|n| RequesterId::new(*n)).collect();
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse_connect.store(refuse, Ordering::SeqCst);
    }

    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Titles attached so far
    pub fn attached(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Attach(title) => Some(title),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&self) -> queuer_core::Result<()> {
        self.record(Call::Connect);
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(QueuerError::transport("destination unreachable"));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn attach(&self, song: &Song, _data: StreamData) -> queuer_core::Result<()> {
        self.record(Call::Attach(song.title().to_string()));
        Ok(())
    }

    async fn pause(&self) -> queuer_core::Result<()> {
        self.record(Call::Pause);
        Ok(())
    }

    async fn resume(&self) -> queuer_core::Result<()> {
        self.record(Call::Resume);
        Ok(())
    }

    async fn stop(&self) -> queuer_core::Result<()> {
        self.record(Call::Stop);
        Ok(())
    }

    async fn disconnect(&self) -> queuer_core::Result<()> {
        self.record(Call::Disconnect);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn set_speaking(&self, speaking: bool) {
        self.speaking.store(speaking, Ordering::SeqCst);
    }

    fn participants(&self) -> Vec<RequesterId> {
        self.participants.lock().unwrap().clone()
    }
}

/// Provider that streams every song except the ones marked unplayable
#[derive(Debug, Default)]
pub struct FakeProvider {
    unplayable: Mutex<HashSet<String>>,
    failing: AtomicBool,
    fetches: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mark_unplayable(&self, title: &str) {
        self.unplayable.lock().unwrap().insert(title.to_string());
    }

    pub fn fail_all(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    /// Number of stream requests served or refused so far
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamProvider for FakeProvider {
    async fn stream_data(&self, song: &Song) -> queuer_core::Result<Option<StreamData>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(QueuerError::provider("lookup failed"));
        }
        if self.unplayable.lock().unwrap().contains(song.title()) {
            return Ok(None);
        }
        Ok(Some(StreamData::Url(format!("fake://{}", song.title()))))
    }
}

pub fn song(title: &str) -> Song {
    Song::new(title, ProviderDescriptor::new(OWNER, ""))
}

pub fn temporary_song(title: &str) -> Song {
    song(title).temporary(true)
}

pub fn registry_with(provider: Arc<FakeProvider>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register_default(OWNER, provider);
    registry
}

/// A queue wired to fakes, driven directly (no task)
pub struct Harness {
    pub queue: Queue,
    pub transport: Arc<FakeTransport>,
    pub provider: Arc<FakeProvider>,
    pub events: broadcast::Receiver<QueueEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default(), FakeTransport::new())
    }

    pub fn with_config(config: QueueConfig, transport: Arc<FakeTransport>) -> Self {
        init_tracing();
        let provider = FakeProvider::new();
        let queue = Queue::new(
            config,
            transport.clone(),
            Arc::new(registry_with(provider.clone())),
        );
        let events = queue.subscribe();
        Self {
            queue,
            transport,
            provider,
            events,
        }
    }

    /// Queue songs by title (the first one starts playing)
    pub async fn with_songs(titles: &[&str]) -> Self {
        let mut harness = Self::new();
        harness.add_all(titles).await;
        harness
    }

    pub async fn add_all(&mut self, titles: &[&str]) {
        for title in titles {
            self.queue
                .add(song(title), AddOptions::default())
                .await
                .unwrap();
        }
        self.drain();
        self.transport.clear_calls();
    }

    /// Titles in play order
    pub fn titles(&self) -> Vec<String> {
        self.queue
            .songs()
            .iter()
            .map(|s| s.title().to_string())
            .collect()
    }

    pub fn current_title(&self) -> Option<String> {
        self.queue.current_song().map(|s| s.title().to_string())
    }

    pub fn id_of(&self, title: &str) -> SongId {
        self.queue
            .songs()
            .into_iter()
            .find(|s| s.title() == title)
            .map(|s| s.id().clone())
            .unwrap()
    }

    /// Names of the events emitted since the last drain
    pub fn drain(&mut self) -> Vec<&'static str> {
        let mut names = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            names.push(event.name());
        }
        names
    }

    /// Events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<QueueEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn assert_consistent(&self) {
        self.queue.tracklist().check().unwrap();
    }
}
