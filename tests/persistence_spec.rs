use std::fs;
use std::sync::Arc;
use std::time::Duration;

use memora::*;
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use tokio::sync::Mutex;

const NOW: i64 = 1_700_000_000_000;

fn open_store(
    file: StateFile,
    debounce: Duration,
) -> (NoteStore, PersistenceWorker, PersistenceHandle) {
    let state = file.load().unwrap().unwrap_or_default();
    let (worker, handle) = PersistenceWorker::spawn(file, debounce);
    let store = NoteStore::from_state(state, Arc::new(ManualClock::new(NOW)))
        .with_sink(Box::new(handle.clone()));
    (store, worker, handle)
}

#[tokio::test]
async fn keystroke_edits_coalesce_to_final_state() {
    let dir = tempdir().unwrap();
    let file = StateFile::in_dir(dir.path());
    let (mut store, mut worker, handle) = open_store(file.clone(), Duration::from_secs(60));

    let id = store.add_note(None);
    let text = "remember the milk";
    for end in 1..=text.len() {
        store.update_note(
            &id,
            NotePatch {
                content: Some(text[..end].to_string()),
                ..Default::default()
            },
        );
    }
    handle.flush().await.unwrap();

    let status = handle.status();
    assert_eq!(status.received, text.len() as u64 + 1);
    assert_eq!(status.writes, 1);
    assert_eq!(file.load().unwrap().unwrap(), store.snapshot());

    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_makes_last_change_durable() {
    let dir = tempdir().unwrap();
    let file = StateFile::in_dir(dir.path());

    let snapshot = {
        let (mut store, mut worker, _handle) = open_store(file.clone(), Duration::from_secs(60));
        let id = store.add_note(Some((5.0, 5.0)));
        store.delete_note(&id);
        worker.shutdown().await.unwrap();
        store.snapshot()
    };

    let (store, mut worker, _handle) = open_store(file, Duration::from_secs(60));
    assert_eq!(store.snapshot(), snapshot);
    assert!(store.notes()[0].is_trashed());
    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn failed_write_is_surfaced_but_state_stays_usable() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "a file where the data dir should be").unwrap();
    let file = StateFile::in_dir(&blocker.join("data"));
    let (mut store, mut worker, handle) = open_store(file, Duration::from_secs(60));

    let id = store.add_note(None);
    assert!(handle.flush().await.is_err());

    let err = store.check_persistence().unwrap_err();
    assert!(err.is_persistence_failure());

    // In-memory state is still authoritative and editable
    assert!(store.update_note(
        &id,
        NotePatch {
            title: Some("still here".into()),
            ..Default::default()
        }
    ));
    assert_eq!(store.note(&id).unwrap().title, "still here");

    assert!(worker.shutdown().await.is_err());
}

#[tokio::test]
async fn scheduler_purges_through_shared_store() {
    let clock = Arc::new(ManualClock::new(NOW));
    let sink = MemorySink::new();
    let mut store = NoteStore::new(clock.clone()).with_sink(Box::new(sink.clone()));
    let old = store.add_note(None);
    let fresh = store.add_note(None);
    store.delete_note(&old);
    clock.advance(TRASH_RETENTION_MS);
    store.delete_note(&fresh);
    let store = Arc::new(Mutex::new(store));

    let mut scheduler = TrashScheduler::new(Duration::from_secs(3600));
    scheduler.set_store(&store);
    scheduler.start().unwrap();
    scheduler.run_now().await.unwrap();
    scheduler.stop().await.unwrap();

    let store = store.lock().await;
    assert!(store.note(&old).is_none());
    assert!(store.note(&fresh).is_some());
    assert_eq!(sink.latest().unwrap().notes.len(), 1);
    assert_eq!(scheduler.get_status().purged_total, 1);
}
