//! Routing table from hot paths to their debounce workers
//!
//! The table only stores the sending half of each worker's inbox. Everything
//! else about a worker stays inside its task. One lock guards the map and is
//! never held across an await: enqueueing under the lock uses `try_send`, and
//! a full inbox is waited on outside the lock and committed afterwards.

use crate::event::{Event, OpClass};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError, OwnedPermit};

pub(crate) struct DebounceTable {
    slots: Mutex<Slots>,
    inbound_capacity: usize,
}

#[derive(Default)]
struct Slots {
    map: HashMap<PathBuf, Slot>,
    /// Distinguishes successive workers for the same path
    next_id: u64,
}

struct Slot {
    id: u64,
    inbox: mpsc::Sender<Event>,
}

impl Slots {
    fn remove_if(&mut self, path: &Path, id: u64) {
        if self.map.get(path).is_some_and(|slot| slot.id == id) {
            self.map.remove(path);
        }
    }
}

/// Where an event went, or where it has to go next
pub(crate) enum Route {
    /// Queued on the owning worker's inbox
    Delivered,
    /// Owning worker's inbox is full; reserve capacity and [`DebounceTable::commit`]
    Busy {
        id: u64,
        inbox: mpsc::Sender<Event>,
        event: Event,
    },
    /// New entry inserted; the caller must start a worker with these parts
    Spawn {
        lease: Lease,
        inbox: mpsc::Receiver<Event>,
        event: Event,
    },
    /// No pending activity for the path; emit as-is
    Direct(Event),
}

impl DebounceTable {
    pub(crate) fn new(inbound_capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(Slots::default()),
            inbound_capacity,
        })
    }

    /// Look up the event's path and route it without blocking
    pub(crate) fn route(self: &Arc<Self>, event: Event) -> Route {
        let mut slots = self.slots.lock();
        let mut event = event;

        if let Some(slot) = slots.map.get(&event.path) {
            let id = slot.id;
            match slot.inbox.try_send(event) {
                Ok(()) => return Route::Delivered,
                Err(TrySendError::Full(returned)) => {
                    return Route::Busy {
                        id,
                        inbox: slot.inbox.clone(),
                        event: returned,
                    };
                }
                Err(TrySendError::Closed(returned)) => event = returned,
            }
            // Worker task died without releasing its entry
            slots.map.remove(&event.path);
        }

        if event.op.class() != OpClass::Activity {
            return Route::Direct(event);
        }

        let (tx, rx) = mpsc::channel(self.inbound_capacity);
        let id = slots.next_id;
        slots.next_id += 1;
        slots.map.insert(event.path.clone(), Slot { id, inbox: tx });
        drop(slots);

        Route::Spawn {
            lease: Lease {
                table: Arc::clone(self),
                path: event.path.clone(),
                id,
                released: false,
            },
            inbox: rx,
            event,
        }
    }

    /// Finish a [`Route::Busy`] delivery once capacity has been reserved
    ///
    /// Returns the event if the worker released its entry in the meantime.
    pub(crate) fn commit(&self, id: u64, permit: OwnedPermit<Event>, event: Event) -> Result<(), Event> {
        let slots = self.slots.lock();
        match slots.map.get(&event.path) {
            Some(slot) if slot.id == id => {
                permit.send(event);
                Ok(())
            }
            _ => Err(event),
        }
    }

    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.slots.lock().map.contains_key(path)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.lock().map.len()
    }

    pub(crate) fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.slots.lock().map.keys().cloned().collect();
        paths.sort();
        paths
    }
}

/// A worker's claim on its table entry
///
/// The entry is removed on [`Lease::settle`] or, failing that, when the lease
/// is dropped, so no exit path of a worker can leave a stale entry behind.
pub(crate) struct Lease {
    table: Arc<DebounceTable>,
    path: PathBuf,
    id: u64,
    released: bool,
}

impl Lease {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Release the entry unless an event is already queued
    ///
    /// The inbox is checked and closed under the table lock, so an event is
    /// either handed back here or routed afresh by the dispatch loop. It is
    /// never dropped on the floor.
    pub(crate) fn settle(&mut self, inbox: &mut mpsc::Receiver<Event>) -> Option<Event> {
        if self.released {
            return None;
        }

        let mut slots = self.table.slots.lock();
        if let Ok(event) = inbox.try_recv() {
            return Some(event);
        }

        slots.remove_if(&self.path, self.id);
        inbox.close();
        self.released = true;
        None
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if !self.released {
            self.table.slots.lock().remove_if(&self.path, self.id);
        }
    }
}
