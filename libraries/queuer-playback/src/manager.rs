//! Queue state machine
//!
//! Owns one playback session: the tracklist, pause/repeat/shuffle state and
//! vote tallies. Drives the transport and asks providers for stream data.
//! Every method takes `&mut self`; [`crate::QueueHandle`] serializes access
//! when the queue runs as its own task.

use crate::{
    config::QueueConfig,
    error::{QueueError, Result},
    events::QueueEvent,
    tracklist::Tracklist,
    types::{
        AddOptions, MoveMode, PauseReason, QueueSnapshot, QueueStatus, RepeatMode, Slot, SongRef,
        VoteKind, VoteOutcome,
    },
    votes::VoteBox,
};
use queuer_core::{
    ProviderRegistry, QueueId, RequesterId, SinkSignal, Song, SongId, StreamData, Transport,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// A delayed advance requested after a sink error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAfter {
    /// Song that failed; the advance is skipped if it is no longer current
    pub song: SongId,
    /// How long to wait
    pub delay: Duration,
}

/// One playback queue
pub struct Queue {
    id: QueueId,
    author: Option<RequesterId>,
    config: QueueConfig,
    tracks: Tracklist,
    transport: Arc<dyn Transport>,
    providers: Arc<ProviderRegistry>,
    pause_reason: PauseReason,
    shuffle: bool,
    repeat: RepeatMode,
    votes: VoteBox,
    destroyed: bool,
    events: broadcast::Sender<QueueEvent>,
}

impl Queue {
    /// Create an empty queue bound to a transport
    pub fn new(
        config: QueueConfig,
        transport: Arc<dyn Transport>,
        providers: Arc<ProviderRegistry>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            id: QueueId::generate(),
            author: None,
            config,
            tracks: Tracklist::new(),
            transport,
            providers,
            pause_reason: PauseReason::NotPaused,
            shuffle: false,
            repeat: RepeatMode::Off,
            votes: VoteBox::new(),
            destroyed: false,
            events,
        }
    }

    /// Record who created the queue
    #[must_use]
    pub fn with_author(mut self, author: RequesterId) -> Self {
        self.author = Some(author);
        self
    }

    // ===== Queries =====

    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn author(&self) -> Option<&RequesterId> {
        self.author.as_ref()
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Songs in play order
    pub fn songs(&self) -> Vec<Song> {
        self.tracks.songs().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Song at the head position
    pub fn current_song(&self) -> Option<&Song> {
        self.tracks.current()
    }

    /// Head position
    pub fn head(&self) -> usize {
        self.tracks.head()
    }

    pub fn is_paused(&self) -> bool {
        self.pause_reason != PauseReason::NotPaused
    }

    pub fn pause_reason(&self) -> PauseReason {
        self.pause_reason
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Underlying arena and play order
    pub fn tracklist(&self) -> &Tracklist {
        &self.tracks
    }

    /// Whether a stream is attached to the current song
    pub fn is_attached(&self) -> bool {
        self.tracks
            .current_slot()
            .is_some_and(|slot| self.tracks.stream(slot).is_some())
    }

    /// Resolve a reference to a song, stepping `offset` positions
    pub fn resolve(&self, target: &SongRef, offset: isize) -> Option<&Song> {
        self.tracks
            .resolve(target, offset)
            .and_then(|slot| self.tracks.song(slot))
    }

    /// Coarse playback state
    pub fn status(&self) -> QueueStatus {
        if self.destroyed {
            QueueStatus::Destroyed
        } else if !self.transport.is_connected() {
            QueueStatus::Disconnected
        } else if self.tracks.is_empty() {
            QueueStatus::Empty
        } else if self.is_paused() {
            QueueStatus::Paused(self.pause_reason)
        } else if self.is_attached() {
            QueueStatus::Playing
        } else {
            QueueStatus::Idle
        }
    }

    /// Everything an observer needs, captured at once
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            id: self.id,
            author: self.author.clone(),
            songs: self.songs(),
            head: self.tracks.head(),
            current: self.tracks.current().cloned(),
            paused: self.is_paused(),
            pause_reason: self.pause_reason,
            repeat: self.repeat,
            shuffle: self.shuffle,
            status: self.status(),
        }
    }

    /// Subscribe to queue events
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<QueueEvent> {
        self.events.clone()
    }

    // ===== Playback Control =====

    /// Resume the current song, or seek to `target` and play it
    ///
    /// With no target and a stream already attached this is a resume. Otherwise
    /// the target (or the current song, or the first song when the target does
    /// not resolve) is fetched from its provider and attached.
    pub async fn play(&mut self, target: Option<SongRef>) -> Result<()> {
        self.ensure_alive()?;
        self.ensure_connected().await?;

        if target.is_none() && self.is_attached() {
            return self.resume().await;
        }

        let slot = match &target {
            Some(target) => self
                .tracks
                .resolve(target, 0)
                .or_else(|| self.tracks.slot_at(0)),
            None => self
                .tracks
                .current_slot()
                .or_else(|| self.tracks.slot_at(0)),
        }
        .ok_or_else(|| QueueError::not_found("queue is empty"))?;

        self.start(slot).await
    }

    /// Play a song, adding it to the end of the queue first
    pub async fn play_song(&mut self, song: Song) -> Result<()> {
        self.ensure_alive()?;
        let slot = self.insert(song, AddOptions::default())?;
        self.play(Some(SongRef::Slot(slot))).await
    }

    /// Pause playback
    ///
    /// With a target, only pauses when the target is the current song. Returns
    /// whether playback was paused.
    pub async fn pause(&mut self, target: Option<SongRef>) -> Result<bool> {
        self.ensure_alive()?;

        if let Some(target) = &target {
            let current = self.tracks.current_slot();
            if current.is_none() || self.tracks.resolve(target, 0) != current {
                return Ok(false);
            }
        }

        if self.transport.is_connected() {
            self.transport.pause().await?;
        }
        self.transport.set_speaking(false);
        self.pause_reason = PauseReason::UserRequest;

        debug!(queue = %self.id, "Paused");
        self.emit(QueueEvent::Pause {
            queue: self.id,
            song: self.tracks.current().cloned(),
        });
        Ok(true)
    }

    /// Advance to the song after `from` (default: the current song)
    ///
    /// An explicit skip overrides song repeat for this call. At the end of the
    /// queue this wraps when repeating the queue and finishes otherwise.
    #[allow(clippy::should_implement_trait)]
    pub async fn next(&mut self, from: Option<SongRef>) -> Result<()> {
        self.ensure_alive()?;

        let from = self.from_position(from.as_ref())?;
        let target = from.and_then(|position| self.tracks.slot_at(position + 1));
        let previous = self.tracks.current().cloned();
        let consume = self.temporary_current();

        self.advance(previous, target, consume).await
    }

    /// Go back to the song before `from` (default: the current song)
    ///
    /// Never wraps: before the first song it replays the first song.
    pub async fn previous(&mut self, from: Option<SongRef>) -> Result<()> {
        self.ensure_alive()?;

        let from = self.from_position(from.as_ref())?;
        let target = from
            .and_then(|position| position.checked_sub(1))
            .and_then(|position| self.tracks.slot_at(position))
            .or_else(|| self.tracks.slot_at(0))
            .ok_or_else(|| QueueError::not_found("queue is empty"))?;

        let current = self.tracks.current().cloned();
        let consume = self.temporary_current();

        self.start(target).await?;
        self.consume(consume, target);

        let previous = self.song_at(target)?;
        info!(queue = %self.id, song = %previous.id(), "Went back");
        self.emit(QueueEvent::Previous {
            queue: self.id,
            current,
            previous,
        });
        Ok(())
    }

    /// Pause, release the transport and mark the queue stopped
    pub async fn stop(&mut self) -> Result<()> {
        self.ensure_alive()?;

        if self.transport.is_connected() {
            if let Err(e) = self.transport.pause().await {
                warn!(queue = %self.id, error = %e, "Pause before stop failed");
            }
            self.transport.stop().await?;
            self.transport.disconnect().await?;
        }
        self.transport.set_speaking(false);
        self.tracks.detach_all();
        self.pause_reason = PauseReason::Stopped;

        info!(queue = %self.id, "Stopped");
        self.emit(QueueEvent::Pause {
            queue: self.id,
            song: self.tracks.current().cloned(),
        });
        Ok(())
    }

    /// Tear the queue down
    ///
    /// Only the first call has any effect; it returns `true`.
    pub async fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;

        if self.transport.is_connected() {
            if let Err(e) = self.transport.stop().await {
                warn!(queue = %self.id, error = %e, "Stopping transport during destroy failed");
            }
            if let Err(e) = self.transport.disconnect().await {
                warn!(queue = %self.id, error = %e, "Disconnecting during destroy failed");
            }
        }
        self.transport.set_speaking(false);
        self.tracks.detach_all();
        self.votes.clear();

        info!(queue = %self.id, "Queue destroyed");
        self.emit(QueueEvent::Destroyed { queue: self.id });
        true
    }

    // ===== Membership =====

    /// Add a song
    ///
    /// Starts playback when the queue was empty or had finished. The song
    /// stays queued even if that playback attempt fails.
    pub async fn add(&mut self, song: Song, options: AddOptions) -> Result<Song> {
        self.ensure_alive()?;

        let autoplay = self.tracks.is_empty() || self.pause_reason == PauseReason::EndOfQueue;
        let slot = self.insert(song, options)?;
        let added = self.song_at(slot)?;

        debug!(queue = %self.id, song = %added.id(), position = ?self.tracks.position_of(slot), "Added song");

        if autoplay {
            if let Err(e) = self.play(Some(SongRef::Slot(slot))).await {
                warn!(queue = %self.id, song = %added.id(), error = %e, "Starting playback of added song failed");
            }
        }
        Ok(added)
    }

    /// Remove a song
    ///
    /// Returns `None` when `target` does not resolve. Removing the song that
    /// is playing moves on to the first playable song from its position, or
    /// finishes the queue when there is none.
    pub async fn remove(&mut self, target: &SongRef) -> Result<Option<Song>> {
        self.ensure_alive()?;

        let Some(slot) = self.tracks.resolve(target, 0) else {
            return Ok(None);
        };
        let was_playing = self.tracks.current_slot() == Some(slot) && self.is_attached();

        let Some((mut song, position)) = self.tracks.remove(slot) else {
            return Ok(None);
        };
        song.set_queue(None);

        debug!(queue = %self.id, song = %song.id(), position, "Removed song");
        self.emit(QueueEvent::Removed {
            queue: self.id,
            song: song.clone(),
        });

        if was_playing {
            self.progress(Some(song.clone()), position, None).await;
        }
        Ok(Some(song))
    }

    /// Move a song relative to another
    ///
    /// Both references resolve before anything changes. The sink is not
    /// touched.
    pub fn move_song(&mut self, song: &SongRef, to: &SongRef, mode: MoveMode) -> Result<()> {
        self.ensure_alive()?;

        let from = self
            .tracks
            .resolve(song, 0)
            .ok_or_else(|| QueueError::not_found(format!("{song:?}")))?;
        let anchor = self
            .tracks
            .resolve(to, 0)
            .ok_or_else(|| QueueError::not_found(format!("{to:?}")))?;

        let moved = match mode {
            MoveMode::After => self.tracks.move_next_to(from, anchor, true),
            MoveMode::Before => self.tracks.move_next_to(from, anchor, false),
            MoveMode::Swap => self.tracks.swap(from, anchor),
        };
        if !moved {
            return Err(QueueError::not_found(format!("{song:?}")));
        }

        debug!(queue = %self.id, ?mode, "Moved song");
        Ok(())
    }

    // ===== Shuffle & Repeat =====

    /// Toggle (or set) shuffle; returns the new state
    ///
    /// Enabling is a fresh permutation; disabling restores insertion order.
    pub fn shuffle(&mut self, enable: Option<bool>) -> Result<bool> {
        self.ensure_alive()?;

        let enable = enable.unwrap_or(!self.shuffle);
        if enable == self.shuffle {
            return Ok(self.shuffle);
        }

        if enable {
            let mut rng = rand::thread_rng();
            self.tracks.shuffle(self.config.shuffle_policy, &mut rng);
        } else {
            self.tracks.unshuffle();
        }
        self.shuffle = enable;

        debug!(queue = %self.id, shuffle = enable, "Shuffle changed");
        Ok(self.shuffle)
    }

    /// Set repeat mode, or advance one step in the cycle when `None`
    pub fn set_repeat(&mut self, mode: Option<RepeatMode>) -> Result<RepeatMode> {
        self.ensure_alive()?;

        self.repeat = mode.unwrap_or_else(|| self.repeat.cycle());
        debug!(queue = %self.id, repeat = ?self.repeat, "Repeat changed");
        Ok(self.repeat)
    }

    // ===== Votes =====

    /// Cast a vote to skip or go back
    pub async fn vote(&mut self, kind: VoteKind, requester: RequesterId) -> Result<VoteOutcome> {
        self.ensure_alive()?;

        let participants = self.transport.participants();
        let outcome = self
            .votes
            .cast(kind, requester, &participants, self.config.vote_threshold);

        if outcome == VoteOutcome::Triggered {
            info!(queue = %self.id, ?kind, "Vote passed");
            self.votes.clear();
            match kind {
                VoteKind::Next => self.next(None).await?,
                VoteKind::Previous => self.previous(None).await?,
            }
        }
        Ok(outcome)
    }

    /// Votes recorded so far for an action
    pub fn vote_count(&self, kind: VoteKind) -> usize {
        self.votes.count(kind)
    }

    // ===== Sink Signals =====

    /// React to a transport lifecycle signal
    ///
    /// Returns a delayed advance to schedule when the sink reported an error.
    /// Signals about songs that are no longer current are ignored.
    pub async fn handle_signal(&mut self, signal: SinkSignal) -> Result<Option<RetryAfter>> {
        if self.destroyed {
            return Ok(None);
        }
        if let Some(song) = signal.song() {
            if !self.is_current(song) {
                debug!(queue = %self.id, song = %song, "Ignoring signal for a song that is not current");
                return Ok(None);
            }
        }

        match signal {
            SinkSignal::Idle { .. } => {
                self.finished_current().await?;
                Ok(None)
            }
            SinkSignal::Error { song, message } => {
                warn!(queue = %self.id, song = %song, error = %message, "Playback error");
                if let Some(slot) = self.tracks.current_slot() {
                    self.tracks.detach(slot);
                }
                self.repeat = if self.tracks.len() <= 1 {
                    RepeatMode::Off
                } else {
                    RepeatMode::Queue
                };
                Ok(Some(RetryAfter {
                    song,
                    delay: self.config.error_retry_delay(),
                }))
            }
            SinkSignal::AutoPaused => {
                if self.pause_reason == PauseReason::NotPaused {
                    self.pause_reason = PauseReason::LostFocus;
                    debug!(queue = %self.id, "Sink paused itself");
                    self.emit(QueueEvent::Pause {
                        queue: self.id,
                        song: self.tracks.current().cloned(),
                    });
                }
                Ok(None)
            }
            SinkSignal::FocusRegained => {
                if self.pause_reason == PauseReason::LostFocus && self.is_attached() {
                    self.resume().await?;
                }
                Ok(None)
            }
            SinkSignal::Playing => {
                if matches!(
                    self.pause_reason,
                    PauseReason::LostFocus | PauseReason::Disconnected
                ) && self.is_attached()
                {
                    self.pause_reason = PauseReason::NotPaused;
                }
                Ok(None)
            }
            SinkSignal::Disconnected => {
                warn!(queue = %self.id, "Transport disconnected");
                self.tracks.detach_all();
                self.transport.set_speaking(false);
                if self.pause_reason != PauseReason::Stopped {
                    self.pause_reason = PauseReason::Disconnected;
                }
                Ok(None)
            }
        }
    }

    /// Run the delayed advance scheduled by a sink error
    pub async fn advance_after_error(&mut self, song: &SongId) -> Result<()> {
        if self.destroyed || !self.is_current(song) {
            return Ok(());
        }
        self.next(None).await
    }

    // ===== Internal =====

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            Err(QueueError::AlreadyDestroyed)
        } else {
            Ok(())
        }
    }

    async fn ensure_connected(&mut self) -> Result<()> {
        if self.transport.is_connected() {
            return Ok(());
        }
        self.transport.connect().await.map_err(|e| {
            warn!(queue = %self.id, error = %e, "Connecting transport failed");
            QueueError::NoActiveConnection(e.to_string())
        })?;
        if self.transport.is_connected() {
            Ok(())
        } else {
            Err(QueueError::NoActiveConnection(
                "transport reported no connection after connect".to_string(),
            ))
        }
    }

    /// Validate and store a song without starting playback
    fn insert(&mut self, mut song: Song, options: AddOptions) -> Result<Slot> {
        song.validate()
            .map_err(|e| QueueError::invalid(e.to_string()))?;
        if let Some(owner) = song.queue() {
            return Err(QueueError::invalid(format!(
                "song {} already belongs to queue {owner}",
                song.id()
            )));
        }
        if self.tracks.contains(song.id()) {
            return Err(QueueError::invalid(format!(
                "song {} is already queued",
                song.id()
            )));
        }

        let len = self.tracks.len();
        let position = if options.next_in_queue {
            if len == 0 {
                0
            } else {
                self.tracks.head() + 1
            }
        } else {
            options.index.filter(|index| *index <= len).unwrap_or(len)
        };

        song.set_queue(Some(self.id));
        Ok(self.tracks.insert(song, position))
    }

    /// Fetch, attach and make `slot` current
    ///
    /// Nothing changes if any step fails.
    async fn start(&mut self, slot: Slot) -> Result<()> {
        self.ensure_connected().await?;
        let song = self.song_at(slot)?;

        if let Some(cached) = self.tracks.stream(slot).cloned() {
            debug!(queue = %self.id, song = %song.id(), "Reusing cached stream");
            return self.attach(slot, &song, cached).await;
        }

        let data = match self.providers.stream_data(&song).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                warn!(queue = %self.id, song = %song.id(), "Provider has no stream for song");
                return Err(QueueError::ItemNotPlayable(song.id().clone()));
            }
            Err(e) => {
                warn!(queue = %self.id, song = %song.id(), error = %e, "Provider failed");
                return Err(QueueError::ItemNotPlayable(song.id().clone()));
            }
        };

        self.attach(slot, &song, data).await
    }

    async fn attach(&mut self, slot: Slot, song: &Song, data: StreamData) -> Result<()> {
        self.transport.attach(song, data.clone()).await?;

        if let Some(previous) = self.tracks.current_slot() {
            self.tracks.detach(previous);
        }
        self.tracks.attach(slot, data);
        self.tracks.set_head_to(slot);
        self.votes.clear();
        self.pause_reason = PauseReason::NotPaused;
        self.transport.set_speaking(true);

        info!(queue = %self.id, song = %song.id(), title = song.title(), "Playing");
        self.emit(QueueEvent::Play {
            queue: self.id,
            song: song.clone(),
        });
        Ok(())
    }

    async fn resume(&mut self) -> Result<()> {
        self.transport.resume().await?;
        self.transport.set_speaking(true);
        self.pause_reason = PauseReason::NotPaused;

        let song = self.tracks.current().cloned();
        debug!(queue = %self.id, "Resumed");
        if let Some(song) = song {
            self.emit(QueueEvent::Play {
                queue: self.id,
                song,
            });
        }
        Ok(())
    }

    /// Shared tail of next / remove-while-playing
    async fn advance(
        &mut self,
        previous: Option<Song>,
        target: Option<Slot>,
        consume: Option<Slot>,
    ) -> Result<()> {
        if let Some(slot) = target {
            self.start(slot).await?;
            self.consume(consume, slot);

            let next = self.song_at(slot)?;
            info!(queue = %self.id, song = %next.id(), "Next song");
            self.emit(QueueEvent::Next {
                queue: self.id,
                previous,
                next,
            });
            return Ok(());
        }

        // Song repeat acts like queue repeat for an explicit advance
        let wraps = matches!(self.repeat, RepeatMode::Queue | RepeatMode::Song);
        if wraps {
            if let Some(first) = self.tracks.slot_at(0) {
                self.start(first).await?;
                self.consume(consume, first);

                let song = self.song_at(first)?;
                info!(queue = %self.id, "Looped to the start of the queue");
                self.emit(QueueEvent::Loop {
                    queue: self.id,
                    song,
                });
                return Ok(());
            }
        }

        self.finish(previous, consume).await;
        Ok(())
    }

    async fn finish(&mut self, last: Option<Song>, consume: Option<Slot>) {
        if self.transport.is_connected() {
            if let Err(e) = self.transport.pause().await {
                warn!(queue = %self.id, error = %e, "Pausing at end of queue failed");
            }
        }
        self.transport.set_speaking(false);
        self.tracks.detach_all();
        if let Some(slot) = consume {
            self.consume_slot(slot);
        }
        self.tracks.set_head(0);
        self.votes.clear();
        self.pause_reason = PauseReason::EndOfQueue;

        info!(queue = %self.id, "Reached the end of the queue");
        self.emit(QueueEvent::Finish {
            queue: self.id,
            last,
        });
    }

    /// The current song finished on its own
    async fn finished_current(&mut self) -> Result<()> {
        let Some(slot) = self.tracks.current_slot() else {
            return Ok(());
        };
        // A finished stream is exhausted
        self.tracks.detach(slot);

        if self.repeat == RepeatMode::Song {
            match self.start(slot).await {
                Ok(()) => {
                    let song = self.song_at(slot)?;
                    debug!(queue = %self.id, song = %song.id(), "Repeating song");
                    self.emit(QueueEvent::Repeat {
                        queue: self.id,
                        song,
                    });
                    return Ok(());
                }
                Err(e) => {
                    warn!(queue = %self.id, error = %e, "Replaying song failed, moving on");
                }
            }
        }

        let previous = self.tracks.current().cloned();
        let position = self.tracks.head() + 1;
        let consume = self.temporary_current();
        self.progress(previous, position, consume).await;
        Ok(())
    }

    /// Move on without a caller to report to
    ///
    /// Tries each song from `position` onwards, skipping the ones that cannot
    /// be played, then applies the end-of-queue rules. Falls back to finishing
    /// when nothing can be started.
    async fn progress(
        &mut self,
        previous: Option<Song>,
        mut position: usize,
        consume: Option<Slot>,
    ) {
        while let Some(slot) = self.tracks.slot_at(position) {
            match self.advance(previous.clone(), Some(slot), consume).await {
                Ok(()) => return,
                Err(QueueError::ItemNotPlayable(song)) => {
                    warn!(queue = %self.id, song = %song, "Skipping unplayable song");
                    position += 1;
                }
                Err(e) => {
                    warn!(queue = %self.id, error = %e, "Advancing failed");
                    self.finish(previous, consume).await;
                    return;
                }
            }
        }

        if let Err(e) = self.advance(previous.clone(), None, consume).await {
            warn!(queue = %self.id, error = %e, "Looping to the start failed");
            self.finish(previous, consume).await;
        }
    }

    fn from_position(&self, from: Option<&SongRef>) -> Result<Option<usize>> {
        match from {
            Some(from) => self
                .tracks
                .resolve_position(from, 0)
                .map(Some)
                .ok_or_else(|| QueueError::not_found(format!("{from:?}"))),
            None if self.tracks.is_empty() => Ok(None),
            None => Ok(Some(self.tracks.head())),
        }
    }

    fn temporary_current(&self) -> Option<Slot> {
        self.tracks
            .current_slot()
            .filter(|slot| self.tracks.song(*slot).is_some_and(Song::is_temporary))
    }

    /// Remove a consumed temporary song unless it is the one now playing
    fn consume(&mut self, consume: Option<Slot>, playing: Slot) {
        if let Some(slot) = consume.filter(|slot| *slot != playing) {
            self.consume_slot(slot);
        }
    }

    fn consume_slot(&mut self, slot: Slot) {
        if let Some((mut song, _)) = self.tracks.remove(slot) {
            song.set_queue(None);
            debug!(queue = %self.id, song = %song.id(), "Dropped temporary song");
            self.emit(QueueEvent::Removed {
                queue: self.id,
                song,
            });
        }
    }

    fn is_current(&self, id: &SongId) -> bool {
        self.tracks.current().is_some_and(|song| song.id() == id)
    }

    fn song_at(&self, slot: Slot) -> Result<Song> {
        self.tracks
            .song(slot)
            .cloned()
            .ok_or_else(|| QueueError::not_found(format!("slot {slot}")))
    }

    fn emit(&self, event: QueueEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("id", &self.id)
            .field("tracks", &self.tracks)
            .field("pause_reason", &self.pause_reason)
            .field("repeat", &self.repeat)
            .field("shuffle", &self.shuffle)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}
