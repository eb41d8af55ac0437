//! Queue registry
//!
//! Maps destinations, sessions and requesters to running queues and owns
//! their lifecycle: `create` spawns a queue (or returns the one already bound
//! to the destination), a watcher forgets the queue once it reports
//! `Destroyed`, and `shutdown` destroys everything.

use crate::{
    config::QueueConfig,
    error::{QueueError, Result},
    events::QueueEvent,
    handle::QueueHandle,
    manager::Queue,
};
use queuer_core::{DestinationId, ProviderRegistry, QueueId, RequesterId, SessionId, Transport};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

/// What to look a queue up by
///
/// Keys are tried in order: queue ID, destination, session, then any queue
/// whose destination the requester is listening at.
#[derive(Debug, Clone, Default)]
pub struct QueueLookup {
    pub queue: Option<QueueId>,
    pub destination: Option<DestinationId>,
    pub session: Option<SessionId>,
    pub requester: Option<RequesterId>,
    /// Only return a queue whose destination includes `requester`
    pub must_include_requester: bool,
}

impl QueueLookup {
    pub fn by_queue(id: QueueId) -> Self {
        Self {
            queue: Some(id),
            ..Self::default()
        }
    }

    pub fn by_destination(destination: DestinationId) -> Self {
        Self {
            destination: Some(destination),
            ..Self::default()
        }
    }

    pub fn by_session(session: SessionId) -> Self {
        Self {
            session: Some(session),
            ..Self::default()
        }
    }

    pub fn by_requester(requester: RequesterId) -> Self {
        Self {
            requester: Some(requester),
            ..Self::default()
        }
    }

    /// Require the requester to be present at the queue's destination
    #[must_use]
    pub fn including(mut self, requester: RequesterId) -> Self {
        self.requester = Some(requester);
        self.must_include_requester = true;
        self
    }
}

struct Binding {
    handle: QueueHandle,
    transport: Arc<dyn Transport>,
    destination: DestinationId,
    session: Option<SessionId>,
}

impl Binding {
    fn includes(&self, requester: &RequesterId) -> bool {
        self.transport.participants().contains(requester)
    }
}

#[derive(Default)]
struct RegistryState {
    queues: HashMap<QueueId, Binding>,
    by_destination: HashMap<DestinationId, QueueId>,
    by_session: HashMap<SessionId, QueueId>,
}

impl RegistryState {
    fn forget(&mut self, id: QueueId) -> bool {
        let Some(binding) = self.queues.remove(&id) else {
            return false;
        };
        if self.by_destination.get(&binding.destination) == Some(&id) {
            self.by_destination.remove(&binding.destination);
        }
        if let Some(session) = &binding.session {
            if self.by_session.get(session) == Some(&id) {
                self.by_session.remove(session);
            }
        }
        true
    }
}

/// Registry of running queues
#[derive(Clone)]
pub struct QueueRegistry {
    config: QueueConfig,
    providers: Arc<ProviderRegistry>,
    state: Arc<RwLock<RegistryState>>,
}

impl QueueRegistry {
    /// Create a registry that builds queues with `config` and `providers`
    pub fn new(config: QueueConfig, providers: ProviderRegistry) -> Self {
        Self {
            config,
            providers: Arc::new(providers),
            state: Arc::new(RwLock::new(RegistryState::default())),
        }
    }

    /// Stream providers handed to every queue
    pub fn providers(&self) -> &Arc<ProviderRegistry> {
        &self.providers
    }

    /// Get the queue bound to `destination`, or create one
    ///
    /// The transport is only used when a new queue is created.
    pub async fn create(
        &self,
        destination: DestinationId,
        session: Option<SessionId>,
        transport: Arc<dyn Transport>,
        author: Option<RequesterId>,
    ) -> Result<QueueHandle> {
        self.config.validate()?;
        let mut state = self.state.write().await;

        if let Some(existing) = state
            .by_destination
            .get(&destination)
            .and_then(|id| state.queues.get(id))
        {
            debug!(destination = %destination, queue = %existing.handle.id(), "Destination already has a queue");
            return Ok(existing.handle.clone());
        }

        let mut queue = Queue::new(self.config.clone(), transport.clone(), self.providers.clone());
        if let Some(author) = author {
            queue = queue.with_author(author);
        }
        let events = queue.subscribe();
        let handle = QueueHandle::spawn(queue);
        let id = handle.id();

        state.by_destination.insert(destination.clone(), id);
        if let Some(session) = &session {
            state.by_session.insert(session.clone(), id);
        }
        state.queues.insert(
            id,
            Binding {
                handle: handle.clone(),
                transport,
                destination: destination.clone(),
                session,
            },
        );
        drop(state);

        tokio::spawn(watch(events, Arc::downgrade(&self.state)));

        info!(queue = %id, destination = %destination, "Created queue");
        Ok(handle)
    }

    /// Find a queue
    pub async fn find(&self, lookup: &QueueLookup) -> Option<QueueHandle> {
        let state = self.state.read().await;

        let accept = |id: &QueueId| -> Option<QueueHandle> {
            let binding = state.queues.get(id)?;
            if lookup.must_include_requester {
                let requester = lookup.requester.as_ref()?;
                if !binding.includes(requester) {
                    return None;
                }
            }
            Some(binding.handle.clone())
        };

        if let Some(found) = lookup.queue.as_ref().and_then(accept) {
            return Some(found);
        }
        if let Some(found) = lookup
            .destination
            .as_ref()
            .and_then(|destination| state.by_destination.get(destination))
            .and_then(accept)
        {
            return Some(found);
        }
        if let Some(found) = lookup
            .session
            .as_ref()
            .and_then(|session| state.by_session.get(session))
            .and_then(accept)
        {
            return Some(found);
        }

        let requester = lookup.requester.as_ref()?;
        let mut listening: Vec<&Binding> = state
            .queues
            .values()
            .filter(|binding| binding.includes(requester))
            .collect();
        listening.sort_by_key(|binding| binding.destination.as_str().to_string());
        listening.first().map(|binding| binding.handle.clone())
    }

    pub async fn get(&self, id: QueueId) -> Option<QueueHandle> {
        self.find(&QueueLookup::by_queue(id)).await
    }

    /// Point a queue at a different destination (the transport moved)
    pub async fn rebind(&self, id: QueueId, destination: DestinationId) -> Result<()> {
        let mut state = self.state.write().await;

        if let Some(other) = state.by_destination.get(&destination) {
            if *other != id {
                return Err(QueueError::invalid(format!(
                    "destination {destination} already has queue {other}"
                )));
            }
            return Ok(());
        }

        let binding = state
            .queues
            .get_mut(&id)
            .ok_or_else(|| QueueError::not_found(id))?;
        let old = std::mem::replace(&mut binding.destination, destination.clone());

        if state.by_destination.get(&old) == Some(&id) {
            state.by_destination.remove(&old);
        }
        state.by_destination.insert(destination.clone(), id);

        info!(queue = %id, from = %old, to = %destination, "Rebound queue");
        Ok(())
    }

    /// Drop a queue's aliases; returns whether it was known
    pub async fn forget(&self, id: QueueId) -> bool {
        self.state.write().await.forget(id)
    }

    /// Handles of every registered queue
    pub async fn list(&self) -> Vec<QueueHandle> {
        self.state
            .read()
            .await
            .queues
            .values()
            .map(|binding| binding.handle.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.queues.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Destroy every queue and clear the registry
    pub async fn shutdown(&self) {
        let handles: Vec<QueueHandle> = {
            let mut state = self.state.write().await;
            state.by_destination.clear();
            state.by_session.clear();
            state
                .queues
                .drain()
                .map(|(_, binding)| binding.handle)
                .collect()
        };

        info!(count = handles.len(), "Shutting down queues");
        for handle in handles {
            handle.destroy().await;
        }
    }
}

impl std::fmt::Debug for QueueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueRegistry")
            .field("config", &self.config)
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

/// Forget a queue once it reports `Destroyed`
async fn watch(mut events: broadcast::Receiver<QueueEvent>, state: Weak<RwLock<RegistryState>>) {
    loop {
        match events.recv().await {
            Ok(QueueEvent::Destroyed { queue }) => {
                if let Some(state) = state.upgrade() {
                    if state.write().await.forget(queue) {
                        debug!(queue = %queue, "Forgot destroyed queue");
                    }
                }
                return;
            }
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}
