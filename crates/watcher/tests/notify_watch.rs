//! End-to-end tests against the OS notification API

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, timeout};
use watcher::{Event, Op, Watcher};

fn watched_dir() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    (dir, root)
}

/// Receive events until none arrives for `quiet`
async fn drain(watcher: &mut Watcher, quiet: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = timeout(quiet, watcher.events.recv()).await {
        events.push(event);
    }
    events
}

fn events_for<'a>(events: &'a [Event], path: &Path) -> Vec<&'a Event> {
    events.iter().filter(|e| e.path == path).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_new_file_settles_once() {
    let (_dir, root) = watched_dir();

    let mut watcher = Watcher::new(Duration::from_secs(1)).unwrap();
    watcher.add(&root).unwrap();

    let file = root.join("t.txt");
    fs::write(&file, b"hello").unwrap();

    sleep(Duration::from_millis(100)).await;
    assert!(watcher.is_pending(&file));

    let event = timeout(Duration::from_secs(2), watcher.events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.path, file);
    assert!(event.op.intersects(Op::CREATE | Op::WRITE));
    assert!(!watcher.is_pending(&file));

    let extra = timeout(Duration::from_millis(300), watcher.events.recv()).await;
    assert!(extra.is_err(), "unexpected second event: {:?}", extra);

    watcher.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rename_of_idle_file_reported_once() {
    let (_dir, root) = watched_dir();
    let old = root.join("a.txt");
    let new = root.join("b.txt");
    fs::write(&old, b"settled").unwrap();

    let mut watcher = Watcher::new(Duration::from_millis(300)).unwrap();
    watcher.add(&root).unwrap();

    fs::rename(&old, &new).unwrap();
    let events = drain(&mut watcher, Duration::from_millis(1500)).await;

    let old_events = events_for(&events, &old);
    assert_eq!(old_events.len(), 1, "events: {:?}", events);
    assert_eq!(old_events[0].op, Op::RENAME);

    let new_events = events_for(&events, &new);
    assert_eq!(new_events.len(), 1, "events: {:?}", events);
    assert_eq!(new_events[0].op, Op::CREATE);

    watcher.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rename_of_pending_file_is_silent() {
    let (_dir, root) = watched_dir();
    let old = root.join("c.txt");
    let new = root.join("d.txt");

    let mut watcher = Watcher::new(Duration::from_millis(300)).unwrap();
    watcher.add(&root).unwrap();

    fs::write(&old, b"draft").unwrap();
    sleep(Duration::from_millis(50)).await;
    fs::rename(&old, &new).unwrap();

    let events = drain(&mut watcher, Duration::from_millis(1500)).await;
    assert!(events_for(&events, &old).is_empty(), "events: {:?}", events);

    let new_events = events_for(&events, &new);
    assert_eq!(new_events.len(), 1, "events: {:?}", events);
    assert_eq!(new_events[0].op, Op::CREATE);

    watcher.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_transient_file_hidden() {
    let (_dir, root) = watched_dir();
    let file = root.join("e.txt");

    let mut watcher = Watcher::new(Duration::from_millis(300)).unwrap();
    watcher.add(&root).unwrap();

    fs::write(&file, b"scratch").unwrap();
    sleep(Duration::from_millis(50)).await;
    fs::remove_file(&file).unwrap();

    let events = drain(&mut watcher, Duration::from_millis(1000)).await;
    assert!(events.is_empty(), "events: {:?}", events);
    assert!(!watcher.is_pending(&file));

    watcher.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_remove_unwatched_path_fails() {
    let (_dir, root) = watched_dir();

    let watcher = Watcher::new(Duration::from_millis(100)).unwrap();
    assert!(watcher.remove(&root).is_err());

    watcher.close().await.unwrap();
    assert!(watcher.add(&root).is_err());
}
