//! Per-queue command loop
//!
//! A queue runs as one tokio task that owns the [`Queue`]. Callers talk to it
//! through a cloneable [`QueueHandle`]; the transport feeds lifecycle signals
//! in through a [`SignalSender`]. Both go through the same mailbox, so user
//! commands and sink callbacks never interleave.

use crate::{
    error::{QueueError, Result},
    events::QueueEvent,
    manager::{Queue, RetryAfter},
    types::{AddOptions, MoveMode, QueueSnapshot, RepeatMode, SongRef, VoteKind, VoteOutcome},
};
use queuer_core::{QueueId, RequesterId, SinkSignal, Song, SongId};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, warn};

type Reply<T> = oneshot::Sender<Result<T>>;

/// Messages processed by the queue task
#[derive(Debug)]
enum Command {
    Add {
        song: Song,
        options: AddOptions,
        reply: Reply<Song>,
    },
    Remove {
        target: SongRef,
        reply: Reply<Option<Song>>,
    },
    Move {
        song: SongRef,
        to: SongRef,
        mode: MoveMode,
        reply: Reply<()>,
    },
    Play {
        target: Option<SongRef>,
        reply: Reply<()>,
    },
    PlaySong {
        song: Song,
        reply: Reply<()>,
    },
    Pause {
        target: Option<SongRef>,
        reply: Reply<bool>,
    },
    Next {
        from: Option<SongRef>,
        reply: Reply<()>,
    },
    Previous {
        from: Option<SongRef>,
        reply: Reply<()>,
    },
    Stop {
        reply: Reply<()>,
    },
    Vote {
        kind: VoteKind,
        requester: RequesterId,
        reply: Reply<VoteOutcome>,
    },
    Shuffle {
        enable: Option<bool>,
        reply: Reply<bool>,
    },
    Repeat {
        mode: Option<RepeatMode>,
        reply: Reply<RepeatMode>,
    },
    Resolve {
        target: SongRef,
        offset: isize,
        reply: oneshot::Sender<Option<Song>>,
    },
    Snapshot {
        reply: oneshot::Sender<QueueSnapshot>,
    },
    Signal(SinkSignal),
    AdvanceAfterError(SongId),
    Destroy {
        reply: oneshot::Sender<bool>,
    },
}

/// Cloneable access to a running queue
#[derive(Debug, Clone)]
pub struct QueueHandle {
    id: QueueId,
    author: Option<RequesterId>,
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<QueueEvent>,
}

impl QueueHandle {
    /// Start the queue's command loop on the current runtime
    ///
    /// The loop ends after `destroy`, or once every handle is dropped (the
    /// queue is destroyed on the way out).
    pub fn spawn(queue: Queue) -> Self {
        let (commands, mailbox) = mpsc::channel(queue.config().mailbox_capacity.max(1));
        let handle = Self {
            id: queue.id(),
            author: queue.author().cloned(),
            events: queue.event_sender(),
            commands: commands.clone(),
        };

        tokio::spawn(run(queue, mailbox, commands.downgrade()));
        handle
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    /// Who created the queue
    pub fn author(&self) -> Option<&RequesterId> {
        self.author.as_ref()
    }

    /// Subscribe to queue events
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    /// Sender the transport uses to deliver lifecycle signals
    pub fn signal_sender(&self) -> SignalSender {
        SignalSender {
            queue: self.id,
            mailbox: self.commands.downgrade(),
        }
    }

    /// Whether the command loop has exited
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    pub async fn add(&self, song: Song, options: AddOptions) -> Result<Song> {
        self.request(|reply| Command::Add {
            song,
            options,
            reply,
        })
        .await
    }

    pub async fn remove(&self, target: impl Into<SongRef>) -> Result<Option<Song>> {
        let target = target.into();
        self.request(|reply| Command::Remove { target, reply }).await
    }

    pub async fn move_song(
        &self,
        song: impl Into<SongRef>,
        to: impl Into<SongRef>,
        mode: MoveMode,
    ) -> Result<()> {
        let (song, to) = (song.into(), to.into());
        self.request(|reply| Command::Move {
            song,
            to,
            mode,
            reply,
        })
        .await
    }

    pub async fn play(&self, target: Option<SongRef>) -> Result<()> {
        self.request(|reply| Command::Play { target, reply }).await
    }

    pub async fn play_song(&self, song: Song) -> Result<()> {
        self.request(|reply| Command::PlaySong { song, reply }).await
    }

    pub async fn pause(&self, target: Option<SongRef>) -> Result<bool> {
        self.request(|reply| Command::Pause { target, reply }).await
    }

    pub async fn next(&self, from: Option<SongRef>) -> Result<()> {
        self.request(|reply| Command::Next { from, reply }).await
    }

    pub async fn previous(&self, from: Option<SongRef>) -> Result<()> {
        self.request(|reply| Command::Previous { from, reply }).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn vote(&self, kind: VoteKind, requester: RequesterId) -> Result<VoteOutcome> {
        self.request(|reply| Command::Vote {
            kind,
            requester,
            reply,
        })
        .await
    }

    pub async fn vote_next(&self, requester: RequesterId) -> Result<VoteOutcome> {
        self.vote(VoteKind::Next, requester).await
    }

    pub async fn vote_previous(&self, requester: RequesterId) -> Result<VoteOutcome> {
        self.vote(VoteKind::Previous, requester).await
    }

    /// Toggle shuffle (`None`) or set it; returns the new state
    pub async fn shuffle(&self, enable: Option<bool>) -> Result<bool> {
        self.request(|reply| Command::Shuffle { enable, reply }).await
    }

    /// Cycle repeat (`None`) or set it; returns the new mode
    pub async fn repeat(&self, mode: Option<RepeatMode>) -> Result<RepeatMode> {
        self.request(|reply| Command::Repeat { mode, reply }).await
    }

    pub async fn resolve(&self, target: impl Into<SongRef>, offset: isize) -> Result<Option<Song>> {
        let target = target.into();
        self.query(|reply| Command::Resolve {
            target,
            offset,
            reply,
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<QueueSnapshot> {
        self.query(|reply| Command::Snapshot { reply }).await
    }

    /// Songs in play order
    pub async fn songs(&self) -> Result<Vec<Song>> {
        Ok(self.snapshot().await?.songs)
    }

    pub async fn current_song(&self) -> Result<Option<Song>> {
        Ok(self.snapshot().await?.current)
    }

    /// Destroy the queue
    ///
    /// Safe to call repeatedly; only the first call returns `true`.
    pub async fn destroy(&self) -> bool {
        self.query(|reply| Command::Destroy { reply })
            .await
            .unwrap_or(false)
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        self.query(build).await?
    }

    async fn query<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| QueueError::AlreadyDestroyed)?;
        response.await.map_err(|_| QueueError::AlreadyDestroyed)
    }
}

/// Delivers transport lifecycle signals to a queue
///
/// Holds only a weak reference to the mailbox, so a transport keeping one
/// does not keep the queue alive.
#[derive(Debug, Clone)]
pub struct SignalSender {
    queue: QueueId,
    mailbox: mpsc::WeakSender<Command>,
}

impl SignalSender {
    pub fn queue_id(&self) -> QueueId {
        self.queue
    }

    /// Queue a signal, waiting for mailbox space
    pub async fn send(&self, signal: SinkSignal) -> Result<()> {
        let mailbox = self.mailbox.upgrade().ok_or(QueueError::AlreadyDestroyed)?;
        mailbox
            .send(Command::Signal(signal))
            .await
            .map_err(|_| QueueError::AlreadyDestroyed)
    }

    /// Queue a signal from synchronous code
    pub fn try_send(&self, signal: SinkSignal) -> Result<()> {
        let mailbox = self.mailbox.upgrade().ok_or(QueueError::AlreadyDestroyed)?;
        mailbox.try_send(Command::Signal(signal)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                QueueError::invalid("queue mailbox is full")
            }
            mpsc::error::TrySendError::Closed(_) => QueueError::AlreadyDestroyed,
        })
    }
}

async fn run(
    mut queue: Queue,
    mut mailbox: mpsc::Receiver<Command>,
    sender: mpsc::WeakSender<Command>,
) {
    let id = queue.id();
    debug!(queue = %id, "Queue loop started");

    while let Some(command) = mailbox.recv().await {
        match command {
            Command::Add {
                song,
                options,
                reply,
            } => {
                let _ = reply.send(queue.add(song, options).await);
            }
            Command::Remove { target, reply } => {
                let _ = reply.send(queue.remove(&target).await);
            }
            Command::Move {
                song,
                to,
                mode,
                reply,
            } => {
                let _ = reply.send(queue.move_song(&song, &to, mode));
            }
            Command::Play { target, reply } => {
                let _ = reply.send(queue.play(target).await);
            }
            Command::PlaySong { song, reply } => {
                let _ = reply.send(queue.play_song(song).await);
            }
            Command::Pause { target, reply } => {
                let _ = reply.send(queue.pause(target).await);
            }
            Command::Next { from, reply } => {
                let _ = reply.send(queue.next(from).await);
            }
            Command::Previous { from, reply } => {
                let _ = reply.send(queue.previous(from).await);
            }
            Command::Stop { reply } => {
                let _ = reply.send(queue.stop().await);
            }
            Command::Vote {
                kind,
                requester,
                reply,
            } => {
                let _ = reply.send(queue.vote(kind, requester).await);
            }
            Command::Shuffle { enable, reply } => {
                let _ = reply.send(queue.shuffle(enable));
            }
            Command::Repeat { mode, reply } => {
                let _ = reply.send(queue.set_repeat(mode));
            }
            Command::Resolve {
                target,
                offset,
                reply,
            } => {
                let _ = reply.send(queue.resolve(&target, offset).cloned());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(queue.snapshot());
            }
            Command::Signal(signal) => match queue.handle_signal(signal).await {
                Ok(Some(retry)) => schedule_retry(&sender, retry),
                Ok(None) => {}
                Err(e) => warn!(queue = %id, error = %e, "Handling sink signal failed"),
            },
            Command::AdvanceAfterError(song) => {
                if let Err(e) = queue.advance_after_error(&song).await {
                    error!(queue = %id, song = %song, error = %e, "Advancing after playback error failed");
                }
            }
            Command::Destroy { reply } => {
                let first = queue.destroy().await;
                let _ = reply.send(first);
                break;
            }
        }
    }

    // All handles dropped without an explicit destroy
    queue.destroy().await;
    debug!(queue = %id, "Queue loop exited");
}

/// Re-enter the mailbox after the error delay
fn schedule_retry(sender: &mpsc::WeakSender<Command>, retry: RetryAfter) {
    let sender = sender.clone();
    tokio::spawn(async move {
        tokio::time::sleep(retry.delay).await;
        if let Some(mailbox) = sender.upgrade() {
            let _ = mailbox.send(Command::AdvanceAfterError(retry.song)).await;
        }
    });
}
