//! Shutdown signal shared by the dispatch loop and its workers

use tokio::sync::watch;

/// Firing side, owned by the watcher handle
///
/// Dropping it has the same effect as firing.
pub(crate) struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Listening side, cloned into every task
#[derive(Clone)]
pub(crate) struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub(crate) fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub(crate) fn fire(&self) {
        self.tx.send_replace(true);
    }
}

impl Shutdown {
    /// Resolve once shutdown has been signalled
    pub(crate) async fn cancelled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
