//! Watcher handle: construction, registration and shutdown

use crate::config::WatcherConfig;
use crate::debounce::DebounceContext;
use crate::dispatch::Dispatcher;
use crate::error::{Result, WatchError};
use crate::event::Event;
use crate::filter::PathFilter;
use crate::shutdown::{self, ShutdownTrigger};
use crate::source::{EventSource, NotifySource, RawStreams};
use crate::table::DebounceTable;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Debounced filesystem watcher
///
/// A Create or Write opens a debounce window for its path. The window is
/// extended by every further Create/Write and the latest event is published
/// on [`Watcher::events`] once the path has been quiet for the debounce
/// duration. Files created and removed within one window are hidden unless
/// [`Watcher::set_ignore_temporary_files`] is turned off, in which case the
/// removal is published immediately.
///
/// Both receivers must be drained: a full channel stalls event delivery.
/// Must be created inside a tokio runtime. Dropping the watcher without
/// calling [`Watcher::close`] stops the dispatch loop and all pending
/// windows in the background.
pub struct Watcher<S: EventSource = NotifySource> {
    /// Settled events
    pub events: mpsc::Receiver<Event>,

    /// Errors reported by the event source, passed through unmodified
    pub errors: mpsc::Receiver<WatchError>,

    source: Mutex<S>,
    table: Arc<DebounceTable>,
    ignore_temporary_files: Arc<AtomicBool>,
    debounce: Duration,
    shutdown: ShutdownTrigger,
    closed: AtomicBool,
    dispatch: Mutex<Option<JoinHandle<()>>>,
}

impl Watcher<NotifySource> {
    /// Create a watcher on the OS notification API with default settings
    pub fn new(debounce: Duration) -> Result<Self> {
        Self::with_config(WatcherConfig::new(debounce))
    }

    /// Create a watcher on the OS notification API
    ///
    /// Nothing is started if the configuration is invalid or the OS watch
    /// handle cannot be acquired.
    pub fn with_config(config: WatcherConfig) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| WatchError::NoRuntime)?;
        let filter = PathFilter::new(&config.ignore)?;
        let (source, streams) = NotifySource::new(config.source_capacity)?;
        Ok(Self::start(runtime, filter, source, streams, &config))
    }
}

impl<S: EventSource> Watcher<S> {
    /// Create a watcher on any event source
    pub fn from_source(source: S, streams: RawStreams, config: WatcherConfig) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| WatchError::NoRuntime)?;
        let filter = PathFilter::new(&config.ignore)?;
        Ok(Self::start(runtime, filter, source, streams, &config))
    }

    fn start(
        runtime: Handle,
        filter: PathFilter,
        source: S,
        streams: RawStreams,
        config: &WatcherConfig,
    ) -> Self {
        let (settled_tx, events) = mpsc::channel(config.sink_capacity);
        let (error_tx, errors) = mpsc::channel(config.sink_capacity);
        let table = DebounceTable::new(config.inbound_capacity);
        let ignore_temporary_files = Arc::new(AtomicBool::new(config.ignore_temporary_files));
        let (trigger, shutdown) = shutdown::channel();

        let context = Arc::new(DebounceContext {
            debounce: config.debounce,
            ignore_temporary_files: Arc::clone(&ignore_temporary_files),
            settled: settled_tx,
        });
        let dispatcher = Dispatcher::new(context, Arc::clone(&table), filter, error_tx, shutdown);
        let dispatch = runtime.spawn(dispatcher.run(streams));

        info!("Watcher started (debounce: {:?})", config.debounce);

        Self {
            events,
            errors,
            source: Mutex::new(source),
            table,
            ignore_temporary_files,
            debounce: config.debounce,
            shutdown: trigger,
            closed: AtomicBool::new(false),
            dispatch: Mutex::new(Some(dispatch)),
        }
    }

    /// Start watching a path (non-recursive)
    pub fn add(&self, path: impl AsRef<Path>) -> Result<()> {
        self.source.lock().add(path.as_ref())
    }

    /// Stop watching a path
    pub fn remove(&self, path: impl AsRef<Path>) -> Result<()> {
        self.source.lock().remove(path.as_ref())
    }

    /// Stop the watcher
    ///
    /// Signals the dispatch loop to stop, cancels every pending window
    /// without emitting it, waits for all of them to finish, then closes the
    /// event source. Once this returns both receivers yield `None` after
    /// their buffered items. Calling it again is a no-op.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.shutdown.fire();

        let dispatch = self.dispatch.lock().take();
        if let Some(handle) = dispatch {
            if let Err(e) = handle.await {
                warn!("Dispatch loop failed: {}", e);
            }
        }

        self.source.lock().close()?;
        info!("Watcher closed");
        Ok(())
    }

    /// True once [`Watcher::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Whether files created and removed within one window are hidden
    pub fn ignore_temporary_files(&self) -> bool {
        self.ignore_temporary_files.load(Ordering::Relaxed)
    }

    /// Change temporary-file handling; applies to windows still pending
    pub fn set_ignore_temporary_files(&self, ignore: bool) {
        self.ignore_temporary_files.store(ignore, Ordering::Relaxed);
    }

    /// Quiet period
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// True while a debounce window is open for the path
    pub fn is_pending(&self, path: impl AsRef<Path>) -> bool {
        self.table.contains(path.as_ref())
    }

    /// Number of paths with an open debounce window
    pub fn pending_count(&self) -> usize {
        self.table.len()
    }

    /// Paths with an open debounce window, sorted
    pub fn pending_paths(&self) -> Vec<PathBuf> {
        self.table.paths()
    }
}
