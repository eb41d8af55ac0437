//! Queue registry tests

mod common;

use common::{init_tracing, registry_with, song, FakeProvider, FakeTransport};
use queuer_core::{DestinationId, RequesterId, SessionId};
use queuer_playback::{AddOptions, QueueConfig, QueueError, QueueLookup, QueueRegistry};

fn new_registry() -> QueueRegistry {
    init_tracing();
    QueueRegistry::new(QueueConfig::default(), registry_with(FakeProvider::new()))
}

fn room(name: &str) -> DestinationId {
    DestinationId::new(name)
}

fn user(name: &str) -> RequesterId {
    RequesterId::new(name)
}

async fn wait_until_empty(registry: &QueueRegistry) {
    for _ in 0..100 {
        if registry.is_empty().await {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("registry still holds {} queues", registry.len().await);
}

#[tokio::test]
async fn create_reuses_queue_bound_to_destination() {
    let registry = new_registry();

    let first = registry
        .create(room("room-1"), None, FakeTransport::new(), Some(user("alice")))
        .await
        .unwrap();
    let second = registry
        .create(room("room-1"), None, FakeTransport::new(), Some(user("bob")))
        .await
        .unwrap();

    assert_eq!(first.id(), second.id());
    assert_eq!(second.author(), Some(&user("alice")));
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn create_rejects_invalid_config() {
    init_tracing();
    let config = QueueConfig {
        vote_threshold: 1.5,
        ..QueueConfig::default()
    };
    let registry = QueueRegistry::new(config, registry_with(FakeProvider::new()));

    let result = registry
        .create(room("room-1"), None, FakeTransport::new(), None)
        .await;
    assert!(matches!(result, Err(QueueError::Config(_))));
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn find_walks_each_key() {
    let registry = new_registry();
    let a = registry
        .create(
            room("room-1"),
            Some(SessionId::new("s1")),
            FakeTransport::with_participants(&["alice"]),
            None,
        )
        .await
        .unwrap();
    let b = registry
        .create(
            room("room-2"),
            None,
            FakeTransport::with_participants(&["bob"]),
            None,
        )
        .await
        .unwrap();

    let found = |handle: Option<queuer_playback::QueueHandle>| handle.map(|h| h.id());

    assert_eq!(found(registry.get(b.id()).await), Some(b.id()));
    assert_eq!(
        found(registry.find(&QueueLookup::by_destination(room("room-1"))).await),
        Some(a.id())
    );
    assert_eq!(
        found(registry.find(&QueueLookup::by_session(SessionId::new("s1"))).await),
        Some(a.id())
    );
    assert_eq!(
        found(registry.find(&QueueLookup::by_requester(user("bob"))).await),
        Some(b.id())
    );
    assert_eq!(
        found(registry.find(&QueueLookup::by_requester(user("carol"))).await),
        None
    );

    // An unknown destination falls through to the requester
    let lookup = QueueLookup {
        destination: Some(room("nowhere")),
        requester: Some(user("alice")),
        ..QueueLookup::default()
    };
    assert_eq!(found(registry.find(&lookup).await), Some(a.id()));
}

#[tokio::test]
async fn must_include_requester_filters_matches() {
    let registry = new_registry();
    let a = registry
        .create(
            room("room-1"),
            None,
            FakeTransport::with_participants(&["alice"]),
            None,
        )
        .await
        .unwrap();
    let b = registry
        .create(
            room("room-2"),
            None,
            FakeTransport::with_participants(&["bob"]),
            None,
        )
        .await
        .unwrap();

    let lookup = QueueLookup::by_queue(a.id()).including(user("alice"));
    assert_eq!(registry.find(&lookup).await.map(|h| h.id()), Some(a.id()));

    // Bob is not at room-1, but is listening to room-2
    let lookup = QueueLookup::by_destination(room("room-1")).including(user("bob"));
    assert_eq!(registry.find(&lookup).await.map(|h| h.id()), Some(b.id()));

    let lookup = QueueLookup::by_queue(a.id()).including(user("carol"));
    assert!(registry.find(&lookup).await.is_none());
}

#[tokio::test]
async fn requester_in_several_destinations_gets_first_by_name() {
    let registry = new_registry();
    let later = registry
        .create(
            room("zeta"),
            None,
            FakeTransport::with_participants(&["alice"]),
            None,
        )
        .await
        .unwrap();
    let earlier = registry
        .create(
            room("alpha"),
            None,
            FakeTransport::with_participants(&["alice"]),
            None,
        )
        .await
        .unwrap();

    let found = registry
        .find(&QueueLookup::by_requester(user("alice")))
        .await
        .unwrap();
    assert_eq!(found.id(), earlier.id());
    assert_ne!(found.id(), later.id());
}

#[tokio::test]
async fn rebind_moves_destination_alias() {
    let registry = new_registry();
    let a = registry
        .create(room("room-1"), None, FakeTransport::new(), None)
        .await
        .unwrap();
    let b = registry
        .create(room("room-2"), None, FakeTransport::new(), None)
        .await
        .unwrap();

    registry.rebind(a.id(), room("room-3")).await.unwrap();
    assert_eq!(
        registry
            .find(&QueueLookup::by_destination(room("room-3")))
            .await
            .map(|h| h.id()),
        Some(a.id())
    );
    assert!(registry
        .find(&QueueLookup::by_destination(room("room-1")))
        .await
        .is_none());

    assert!(matches!(
        registry.rebind(a.id(), room("room-2")).await,
        Err(QueueError::InvalidArgument(_))
    ));
    assert!(registry.rebind(b.id(), room("room-2")).await.is_ok());

    b.destroy().await;
    a.destroy().await;
    wait_until_empty(&registry).await;
    assert!(matches!(
        registry.rebind(a.id(), room("room-9")).await,
        Err(QueueError::ItemNotFound(_))
    ));
}

#[tokio::test]
async fn destroyed_queue_is_forgotten() {
    let registry = new_registry();
    let handle = registry
        .create(
            room("room-1"),
            Some(SessionId::new("s1")),
            FakeTransport::new(),
            None,
        )
        .await
        .unwrap();

    assert!(handle.destroy().await);
    wait_until_empty(&registry).await;

    assert!(registry
        .find(&QueueLookup::by_session(SessionId::new("s1")))
        .await
        .is_none());

    // The destination is free again
    let fresh = registry
        .create(room("room-1"), None, FakeTransport::new(), None)
        .await
        .unwrap();
    assert_ne!(fresh.id(), handle.id());
}

#[tokio::test]
async fn forget_keeps_queue_running() {
    let registry = new_registry();
    let handle = registry
        .create(room("room-1"), None, FakeTransport::new(), None)
        .await
        .unwrap();

    assert!(registry.forget(handle.id()).await);
    assert!(!registry.forget(handle.id()).await);
    assert!(registry.is_empty().await);

    handle.add(song("A"), AddOptions::default()).await.unwrap();
    assert_eq!(handle.songs().await.unwrap().len(), 1);
}

#[tokio::test]
async fn shutdown_destroys_everything() {
    let registry = new_registry();
    let mut handles = Vec::new();
    for name in ["room-1", "room-2", "room-3"] {
        handles.push(
            registry
                .create(room(name), None, FakeTransport::new(), None)
                .await
                .unwrap(),
        );
    }
    assert_eq!(registry.list().await.len(), 3);

    registry.shutdown().await;
    assert!(registry.is_empty().await);

    for handle in handles {
        assert!(matches!(
            handle.add(song("A"), AddOptions::default()).await,
            Err(QueueError::AlreadyDestroyed)
        ));
    }
}
