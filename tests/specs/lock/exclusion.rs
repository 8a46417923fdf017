//! Mutual exclusion specs
//!
//! At most one contender holds a given lock name at any instant.

use crate::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_store_contenders_never_overlap() {
    let service = LockService::new(MemoryLockStore::new());
    let occupancy = Occupancy::new();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let mutex = service.new_lock("jobs", Duration::from_secs(30), RETRY);
        let occupancy = occupancy.clone();
        handles.push(tokio::spawn(async move {
            mutex.run_locked(|| occupancy.enter(Duration::from_millis(10))).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(occupancy.max_inside(), 1);
    assert_eq!(occupancy.entries(), 10);
    assert!(service.store().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_store_contenders_in_separate_services_never_overlap() {
    let shared = SharedDir::new();
    let occupancy = Occupancy::new();

    let mut handles = Vec::new();
    for _ in 0..6 {
        // Each contender opens its own store, as a separate process would
        let service = LockService::new(shared.store());
        let mutex = service.new_lock("nightly-report", Duration::from_secs(30), RETRY);
        let occupancy = occupancy.clone();
        handles.push(tokio::spawn(async move {
            mutex.lock().await;
            occupancy.enter(Duration::from_millis(10)).await;
            mutex.unlock().await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(occupancy.max_inside(), 1);
    assert_eq!(occupancy.entries(), 6);
    assert!(shared.store().read("nightly-report").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn distinct_names_do_not_contend() {
    let service = LockService::new(MemoryLockStore::new());
    let a = service.new_lock("a", Duration::from_secs(30), RETRY);
    let b = service.new_lock("b", Duration::from_secs(30), RETRY);

    a.lock().await;
    assert!(b.try_lock().await);

    assert_eq!(
        service.store().names(),
        vec!["a".to_string(), "b".to_string()]
    );
}

#[tokio::test]
async fn uncontended_lock_succeeds_on_first_attempt() {
    let observer = RecordingObserver::new();
    let service = LockService::new(MemoryLockStore::new()).with_observer(Arc::new(observer.clone()));
    let mutex = service.new_lock("jobs", Duration::from_secs(30), Duration::from_secs(60));

    mutex
        .lock_within(Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(
        observer.events(),
        vec![LockEvent::Acquired {
            name: "jobs".into(),
            attempts: 1
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn second_contender_times_out_while_first_holds() {
    let service = LockService::new(MemoryLockStore::new());
    let first = service.new_lock("jobs", Duration::from_secs(30), Duration::from_millis(100));
    let second = service.new_lock("jobs", Duration::from_secs(30), Duration::from_millis(100));

    first.lock().await;
    let err = second
        .lock_within(Duration::from_millis(450))
        .await
        .unwrap_err();

    assert!(matches!(err, LockError::DeadlineExceeded { .. }), "{err}");
    assert_eq!(first.state().await.unwrap(), LockState::Held);

    first.unlock().await;
    second.lock_within(Duration::from_millis(450)).await.unwrap();
}
