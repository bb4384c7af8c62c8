//! Event source backed by the platform's native notification API

use super::{EventSource, RawStreams};
use crate::error::{Result, WatchError};
use crate::event::{Event, Op};
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::trace;

/// Event source wrapping `notify::RecommendedWatcher`
///
/// Paths are watched non-recursively. Events are bridged from the notify
/// thread into bounded tokio channels; a full channel blocks the notify
/// thread until the dispatch loop catches up.
pub struct NotifySource {
    /// None once closed
    watcher: Option<RecommendedWatcher>,
}

impl NotifySource {
    /// Create the OS watch handle and its event streams
    pub fn new(capacity: usize) -> Result<(Self, RawStreams)> {
        let (event_tx, events) = mpsc::channel(capacity);
        let (error_tx, errors) = mpsc::channel(capacity);

        let watcher = notify::recommended_watcher(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    for raw in translate(event) {
                        trace!("raw event: {}", raw);
                        // Receiver gone means the dispatch loop has stopped
                        if event_tx.blocking_send(raw).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    let _ = error_tx.blocking_send(WatchError::Notify(err));
                }
            },
        )?;

        Ok((
            Self {
                watcher: Some(watcher),
            },
            RawStreams { events, errors },
        ))
    }

    fn watcher(&mut self) -> Result<&mut RecommendedWatcher> {
        self.watcher.as_mut().ok_or(WatchError::Closed)
    }
}

impl EventSource for NotifySource {
    fn add(&mut self, path: &Path) -> Result<()> {
        self.watcher()?.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        self.watcher()?.unwatch(path)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        // Dropping the watcher removes every OS watch
        self.watcher.take();
        Ok(())
    }
}

/// Translate a notify event into one event per path
///
/// Renames follow the "old name goes away, new name appears" model: the old
/// path gets RENAME and the new path gets CREATE. Access events are dropped;
/// the OS reports them after every write and they carry no change.
fn translate(event: notify::Event) -> Vec<Event> {
    let op = match event.kind {
        EventKind::Create(_) => Op::CREATE,
        EventKind::Modify(ModifyKind::Metadata(_)) => Op::CHMOD,
        EventKind::Modify(ModifyKind::Name(mode)) => return translate_rename(mode, event.paths),
        EventKind::Modify(_) => Op::WRITE,
        EventKind::Remove(_) => Op::REMOVE,
        EventKind::Access(_) => return Vec::new(),
        EventKind::Any | EventKind::Other => Op::OTHER,
    };

    event
        .paths
        .into_iter()
        .map(|path| Event::new(path, op))
        .collect()
}

fn translate_rename(mode: RenameMode, paths: Vec<PathBuf>) -> Vec<Event> {
    match mode {
        RenameMode::To => paths
            .into_iter()
            .map(|path| Event::new(path, Op::CREATE))
            .collect(),
        // Sent after the From and To halves of the same move
        RenameMode::Both => Vec::new(),
        _ => paths
            .into_iter()
            .map(|path| Event::new(path, Op::RENAME))
            .collect(),
    }
}
