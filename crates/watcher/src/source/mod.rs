//! Raw event sources feeding the dispatch loop
//!
//! A source hands the watcher two streams (events and errors) at
//! construction time and keeps the registration calls for itself.

mod channel;
mod fs;

pub use channel::{ChannelFeed, ChannelSource};
pub use fs::NotifySource;

use crate::error::{Result, WatchError};
use crate::event::Event;
use std::path::Path;
use tokio::sync::mpsc;

/// Streams produced by an event source
///
/// Events must arrive in the order the source observed them for any one
/// path. Errors are unordered relative to events.
pub struct RawStreams {
    /// Raw change notifications
    pub events: mpsc::Receiver<Event>,
    /// Errors reported by the source
    pub errors: mpsc::Receiver<WatchError>,
}

/// Registration side of a raw event source
pub trait EventSource: Send + 'static {
    /// Start watching a path
    fn add(&mut self, path: &Path) -> Result<()>;

    /// Stop watching a path
    fn remove(&mut self, path: &Path) -> Result<()>;

    /// Release the underlying watch handle
    ///
    /// Later `add`/`remove` calls fail with [`WatchError::Closed`].
    fn close(&mut self) -> Result<()>;
}
