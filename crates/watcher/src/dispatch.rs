//! Dispatch loop: the single consumer of the raw event source
//!
//! Each raw event is either queued on the worker that owns its path, used to
//! start a new worker, or emitted straight away when nothing is pending for
//! the path. Source errors bypass the debounce machinery entirely.

use crate::debounce::{DebounceContext, Worker};
use crate::error::WatchError;
use crate::event::Event;
use crate::filter::PathFilter;
use crate::shutdown::Shutdown;
use crate::source::RawStreams;
use crate::table::{DebounceTable, Route};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

pub(crate) struct Dispatcher {
    context: Arc<DebounceContext>,
    table: Arc<DebounceTable>,
    filter: PathFilter,
    errors: mpsc::Sender<WatchError>,
    shutdown: Shutdown,
    /// Live workers, so shutdown can wait for them
    workers: JoinSet<()>,
}

impl Dispatcher {
    pub(crate) fn new(
        context: Arc<DebounceContext>,
        table: Arc<DebounceTable>,
        filter: PathFilter,
        errors: mpsc::Sender<WatchError>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            context,
            table,
            filter,
            errors,
            shutdown,
            workers: JoinSet::new(),
        }
    }

    /// Run until shutdown or until the source's event stream ends
    ///
    /// Does not return before every worker it started has finished.
    pub(crate) async fn run(mut self, streams: RawStreams) {
        let RawStreams {
            mut events,
            mut errors,
        } = streams;
        let mut errors_open = true;

        debug!("Dispatch loop started (debounce: {:?})", self.context.debounce);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                Some(joined) = self.workers.join_next(), if !self.workers.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Debounce worker failed: {}", e);
                    }
                }
                // Errors first so event traffic cannot hold them back
                received = errors.recv(), if errors_open => match received {
                    Some(error) => self.forward_error(error).await,
                    None => errors_open = false,
                },
                received = events.recv() => match received {
                    Some(event) => self.dispatch(event).await,
                    None => {
                        debug!("Raw event stream closed");
                        break;
                    }
                },
            }
        }

        // Stop accepting raw events before waiting on the workers
        drop(events);
        drop(errors);

        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                warn!("Debounce worker failed: {}", e);
            }
        }

        debug!("Dispatch loop stopped");
    }

    /// Route one raw event
    async fn dispatch(&mut self, event: Event) {
        if self.filter.is_ignored(&event.path) {
            trace!("Filtered {}", event);
            return;
        }

        let mut event = event;
        loop {
            match self.table.route(event) {
                Route::Delivered => return,
                Route::Direct(event) => {
                    trace!("Passing through {}", event);
                    self.context.emit(event, &mut self.shutdown).await;
                    return;
                }
                Route::Spawn {
                    lease,
                    inbox,
                    event,
                } => {
                    debug!("Debouncing {}", lease.path().display());
                    let worker = Worker::new(
                        Arc::clone(&self.context),
                        lease,
                        inbox,
                        self.shutdown.clone(),
                    );
                    self.workers.spawn(worker.run(event));
                    return;
                }
                Route::Busy {
                    id,
                    inbox,
                    event: queued,
                } => {
                    // Wait for room outside the table lock
                    let reserved = tokio::select! {
                        permit = inbox.reserve_owned() => permit.ok(),
                        _ = self.shutdown.cancelled() => return,
                    };

                    // Worker resolved while we waited: route from scratch
                    event = match reserved {
                        Some(permit) => match self.table.commit(id, permit, queued) {
                            Ok(()) => return,
                            Err(returned) => returned,
                        },
                        None => queued,
                    };
                }
            }
        }
    }

    async fn forward_error(&mut self, error: WatchError) {
        tokio::select! {
            sent = self.errors.send(error) => {
                if sent.is_err() {
                    debug!("Error receiver dropped");
                }
            }
            _ = self.shutdown.cancelled() => {}
        }
    }
}
