use std::sync::Arc;
use tabstate_storage::{ChangeBus, KeyValueStorage, MemoryStorage, StorageOrigin};
use tabstate_types::{ChangeNotification, StorageKind};
use tokio::sync::broadcast::error::TryRecvError;

// ── ChangeBus ────────────────────────────────────────────────────

#[tokio::test]
async fn publish_reaches_every_subscriber() {
    let bus = ChangeBus::new();
    let mut a = bus.subscribe();
    let mut b = bus.subscribe();
    assert_eq!(bus.receiver_count(), 2);

    let reached = bus.publish(ChangeNotification::new("slot", Some("{}".into())));
    assert_eq!(reached, 2);

    assert_eq!(a.recv().await.unwrap().key, "slot");
    assert_eq!(b.recv().await.unwrap().key, "slot");
}

#[tokio::test]
async fn publish_without_subscribers_is_not_an_error() {
    let bus = ChangeBus::new();
    assert_eq!(bus.publish(ChangeNotification::new("slot", None)), 0);
}

#[tokio::test]
async fn subscribers_only_see_later_notifications() {
    let bus = ChangeBus::new();
    let _keep = bus.subscribe();
    bus.publish(ChangeNotification::new("early", None));

    let mut late = bus.subscribe();
    assert!(matches!(late.try_recv(), Err(TryRecvError::Empty)));

    bus.publish(ChangeNotification::new("late", None));
    assert_eq!(late.recv().await.unwrap().key, "late");
}

#[tokio::test]
async fn clones_share_the_channel() {
    let bus = ChangeBus::with_capacity(4);
    let other = bus.clone();
    let mut rx = bus.subscribe();

    other.publish(ChangeNotification::new("slot", Some("1".into())));
    assert_eq!(rx.recv().await.unwrap().new_value.as_deref(), Some("1"));
}

// ── StorageOrigin ────────────────────────────────────────────────

#[test]
fn origin_separates_storage_kinds() {
    let origin = StorageOrigin::in_memory();
    origin
        .storage(StorageKind::Local)
        .set_item("k", "local")
        .unwrap();

    assert_eq!(
        origin.storage(StorageKind::Local).get_item("k").unwrap().as_deref(),
        Some("local")
    );
    assert_eq!(origin.storage(StorageKind::Session).get_item("k").unwrap(), None);
}

#[test]
fn origin_clones_share_storage() {
    let session = Arc::new(MemoryStorage::new());
    let origin = StorageOrigin::new(
        Arc::new(MemoryStorage::new()),
        session.clone(),
        ChangeBus::new(),
    );
    let other = origin.clone();

    other
        .storage(StorageKind::Session)
        .set_item("k", "v")
        .unwrap();
    assert_eq!(session.get_item("k").unwrap().as_deref(), Some("v"));
}
