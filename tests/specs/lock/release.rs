//! Release specs
//!
//! Unlock is best effort: it retries a few times, then leaves the record to
//! its TTL without surfacing an error.

use crate::prelude::*;

#[tokio::test]
async fn unlock_frees_the_name() {
    let shared = SharedDir::new();
    let mutex = LockService::new(shared.store()).new_lock("jobs", Duration::from_secs(30), RETRY);

    mutex.lock().await;
    assert_eq!(mutex.state().await.unwrap(), LockState::Held);

    mutex.unlock().await;
    assert_eq!(mutex.state().await.unwrap(), LockState::Free);
}

#[tokio::test]
async fn unlock_when_nothing_is_held_returns() {
    let shared = SharedDir::new();
    let observer = RecordingObserver::new();
    let mutex = LockService::new(shared.store())
        .with_observer(Arc::new(observer.clone()))
        .new_lock("jobs", Duration::from_secs(30), RETRY);

    mutex.unlock().await;
    mutex.unlock().await;

    assert!(observer.failures().is_empty());
}

#[tokio::test]
async fn unlock_gives_up_after_three_failed_deletes() {
    let store = FakeLockStore::new();
    let observer = RecordingObserver::new();
    let mutex = LockService::new(TracedLockStore::new(store.clone()))
        .with_observer(Arc::new(observer.clone()))
        .new_lock("jobs", Duration::from_secs(30), RETRY);

    mutex.lock().await;
    store.fail_deletes(Some(StoreError::Unavailable("503".into())));
    mutex.unlock().await;

    assert_eq!(store.delete_calls(), 3);
    assert_eq!(
        observer.events().last(),
        Some(&LockEvent::ReleaseAbandoned {
            name: "jobs".into(),
            attempts: 3
        })
    );
    assert!(store.get("jobs").is_some(), "record is left for its ttl");
}

#[tokio::test]
async fn unlock_failure_on_disk_is_absorbed() {
    let shared = SharedDir::new();
    let store = shared.store();
    // A directory where the record should be cannot be unlinked as a file
    std::fs::create_dir(store.record_path("jobs")).unwrap();
    let observer = RecordingObserver::new();

    let mutex = LockService::new(store)
        .with_observer(Arc::new(observer.clone()))
        .new_lock("jobs", Duration::from_secs(30), RETRY);
    mutex.unlock().await;

    assert_eq!(
        observer.names(),
        vec![
            "lock:release_failed",
            "lock:release_failed",
            "lock:release_failed",
            "lock:release_abandoned",
        ]
    );
}
