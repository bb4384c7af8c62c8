//! Per-path debounce worker
//!
//! One worker runs per hot path. It buffers the latest Create/Write as the
//! representative event and emits it once the path has been quiet for the
//! full debounce duration. A Remove or Rename ends the window early.

use crate::event::{Event, OpClass};
use crate::shutdown::Shutdown;
use crate::table::Lease;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

/// State shared by the dispatch loop and every worker
pub(crate) struct DebounceContext {
    /// Quiet period
    pub(crate) debounce: Duration,
    /// Live value of the watcher's `ignore_temporary_files` flag
    pub(crate) ignore_temporary_files: Arc<AtomicBool>,
    /// Settled-event sink
    pub(crate) settled: mpsc::Sender<Event>,
}

impl DebounceContext {
    /// Send on the settled sink unless shutdown comes first
    pub(crate) async fn emit(&self, event: Event, shutdown: &mut Shutdown) {
        tokio::select! {
            sent = self.settled.send(event) => {
                if sent.is_err() {
                    debug!("Settled-event receiver dropped");
                }
            }
            _ = shutdown.cancelled() => {}
        }
    }
}

/// Terminal outcome of one activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Quiet period elapsed
    Emitted,
    /// Remove ended the window
    Suppressed,
    /// Rename ended the window
    Reclassified,
    /// Non-activity event with no open window, forwarded as-is
    Passthrough,
}

enum Wake {
    Shutdown,
    Inbox(Option<Event>),
    Deadline,
}

pub(crate) struct Worker {
    context: Arc<DebounceContext>,
    lease: Lease,
    inbox: mpsc::Receiver<Event>,
    shutdown: Shutdown,
}

impl Worker {
    pub(crate) fn new(
        context: Arc<DebounceContext>,
        lease: Lease,
        inbox: mpsc::Receiver<Event>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            context,
            lease,
            inbox,
            shutdown,
        }
    }

    /// Drive the worker until its table entry is released
    ///
    /// Each activation emits at most one event. If events were queued
    /// behind a terminal one, the next activation starts with them instead
    /// of releasing the entry, so per-path order is kept.
    pub(crate) async fn run(mut self, trigger: Event) {
        let mut next = Some(trigger);

        while let Some(event) = next.take() {
            let (outcome, emit) = match event.op.class() {
                OpClass::Activity => match self.pending(event).await {
                    Some(resolved) => resolved,
                    None => {
                        debug!("Debounce cancelled for {}", self.lease.path().display());
                        return;
                    }
                },
                _ => (Outcome::Passthrough, Some(event)),
            };

            // An emitted window has already released its entry
            if outcome != Outcome::Emitted {
                next = self.lease.settle(&mut self.inbox);
            }

            debug!("{} resolved as {:?}", self.lease.path().display(), outcome);
            if let Some(event) = emit {
                self.context.emit(event, &mut self.shutdown).await;
            }
        }
    }

    /// Hold a window open until it resolves
    ///
    /// Returns None on shutdown.
    async fn pending(&mut self, first: Event) -> Option<(Outcome, Option<Event>)> {
        let debounce = self.context.debounce;
        let deadline = sleep(debounce);
        tokio::pin!(deadline);

        let mut representative = first;
        trace!("Window opened by {}", representative);

        loop {
            let wake = tokio::select! {
                _ = self.shutdown.cancelled() => Wake::Shutdown,
                received = self.inbox.recv() => Wake::Inbox(received),
                _ = &mut deadline => Wake::Deadline,
            };

            let event = match wake {
                Wake::Shutdown | Wake::Inbox(None) => return None,
                Wake::Inbox(Some(event)) => event,
                Wake::Deadline => match self.lease.settle(&mut self.inbox) {
                    None => return Some((Outcome::Emitted, Some(representative))),
                    // Queued before the deadline was observed; counts as in-window
                    Some(late) => late,
                },
            };

            match event.op.class() {
                OpClass::Activity => {
                    trace!("Window extended by {}", event);
                    representative = event;
                    deadline.as_mut().reset(deadline_after(debounce));
                }
                OpClass::Remove => {
                    let keep_removal = !self.context.ignore_temporary_files.load(Ordering::Relaxed);
                    return Some((Outcome::Suppressed, keep_removal.then_some(event)));
                }
                OpClass::Rename => return Some((Outcome::Reclassified, None)),
                OpClass::Other => trace!("Ignoring {} while pending", event),
            }
        }
    }
}

/// Deadline `debounce` from now, clamped for durations too large to add
fn deadline_after(debounce: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(debounce)
        .unwrap_or_else(|| now + Duration::from_secs(86400 * 365 * 30))
}
