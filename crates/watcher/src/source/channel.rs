//! In-process event source fed by hand

use super::{EventSource, RawStreams};
use crate::error::{Result, WatchError};
use crate::event::Event;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Registrations shared between the source and its feed
#[derive(Default)]
struct Registry {
    watched: BTreeSet<PathBuf>,
    closed: bool,
}

/// Event source whose events are pushed through a [`ChannelFeed`]
///
/// Useful for bridging producers other than the OS notification API, and
/// for driving the watcher deterministically in tests.
pub struct ChannelSource {
    registry: Arc<Mutex<Registry>>,
}

/// Sending half of a [`ChannelSource`]
#[derive(Clone)]
pub struct ChannelFeed {
    events: mpsc::Sender<Event>,
    errors: mpsc::Sender<WatchError>,
    registry: Arc<Mutex<Registry>>,
}

impl ChannelSource {
    /// Create a source, its feed, and the streams to hand to the watcher
    pub fn new(capacity: usize) -> (Self, ChannelFeed, RawStreams) {
        let (event_tx, events) = mpsc::channel(capacity);
        let (error_tx, errors) = mpsc::channel(capacity);
        let registry = Arc::new(Mutex::new(Registry::default()));

        let feed = ChannelFeed {
            events: event_tx,
            errors: error_tx,
            registry: Arc::clone(&registry),
        };

        (Self { registry }, feed, RawStreams { events, errors })
    }
}

impl EventSource for ChannelSource {
    fn add(&mut self, path: &Path) -> Result<()> {
        let mut registry = self.registry.lock();
        if registry.closed {
            return Err(WatchError::Closed);
        }
        registry.watched.insert(path.to_path_buf());
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        let mut registry = self.registry.lock();
        if registry.closed {
            return Err(WatchError::Closed);
        }
        if !registry.watched.remove(path) {
            return Err(WatchError::NotWatched(path.to_path_buf()));
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut registry = self.registry.lock();
        registry.closed = true;
        registry.watched.clear();
        Ok(())
    }
}

impl ChannelFeed {
    /// Push a raw event; fails with [`WatchError::Closed`] once the watcher stopped listening
    pub async fn send(&self, event: Event) -> Result<()> {
        self.events.send(event).await.map_err(|_| WatchError::Closed)
    }

    /// Push a source error
    pub async fn error(&self, error: WatchError) -> Result<()> {
        self.errors.send(error).await.map_err(|_| WatchError::Closed)
    }

    /// Paths currently registered through `add`
    pub fn watched(&self) -> Vec<PathBuf> {
        self.registry.lock().watched.iter().cloned().collect()
    }

    /// True once the source has been closed
    pub fn is_closed(&self) -> bool {
        self.registry.lock().closed
    }
}
