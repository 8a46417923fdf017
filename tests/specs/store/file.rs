//! File store specs
//!
//! Locks configured from TOML coordinate through a shared directory.

use crate::prelude::*;

const CONFIG: &str = r#"
name = "nightly/report"
ttl = "30s"
release_attempts = 2

[retry]
kind = "exponential"
initial = "10ms"
max = "40ms"
"#;

#[tokio::test]
async fn configured_lock_round_trips_through_directory() {
    let shared = SharedDir::new();
    let config = MutexConfig::from_toml_str(CONFIG).unwrap();
    let mutex = LockService::new(shared.store())
        .lock_from_config(&config)
        .unwrap();

    mutex.lock().await;

    let store = shared.store();
    let path = store.record_path("nightly/report");
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        "nightly%2Freport.lock"
    );
    let record = store.read("nightly/report").await.unwrap();
    assert_eq!(record.ttl, 30);

    mutex.unlock().await;
    assert!(!path.exists());
}

#[tokio::test]
async fn configured_lock_uses_release_attempts() {
    let shared = SharedDir::new();
    let store = shared.store();
    std::fs::create_dir(store.record_path("nightly/report")).unwrap();
    let observer = RecordingObserver::new();

    let config = MutexConfig::from_toml_str(CONFIG).unwrap();
    let mutex = LockService::new(store)
        .with_observer(Arc::new(observer.clone()))
        .lock_from_config(&config)
        .unwrap();
    mutex.unlock().await;

    assert_eq!(
        observer.events().last(),
        Some(&LockEvent::ReleaseAbandoned {
            name: "nightly/report".into(),
            attempts: 2
        })
    );
}

#[tokio::test]
async fn held_record_is_visible_to_other_store_handles() {
    let shared = SharedDir::new();
    let holder = LockService::new(shared.store()).new_lock("jobs", Duration::from_secs(30), RETRY);
    let other = LockService::new(shared.store()).new_lock("jobs", Duration::from_secs(30), RETRY);

    holder.lock().await;

    assert!(!other.try_lock().await);
    assert_eq!(other.state().await.unwrap(), LockState::Held);
}

#[test]
fn invalid_config_is_rejected_before_use() {
    let err = MutexConfig::from_toml_str("name = \"jobs\"\nttl = \"0s\"\n").unwrap_err();
    assert!(matches!(err, LockError::InvalidConfig(_)), "{err}");
}
