use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::storage::{Data, Store};

#[derive(Debug, Default)]
struct Slot {
    pending: Option<Data>,
    closed: bool,
}

type Shared = Arc<(Mutex<Slot>, Condvar)>;

fn lock(shared: &Shared) -> MutexGuard<'_, Slot> {
    shared.0.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Background writer for the state file.
///
/// At most one snapshot waits at a time: a newer `save` replaces a pending
/// one that has not been picked up yet. `close` (or drop) writes whatever is
/// still pending and joins the writer thread.
pub struct Persister {
    shared: Shared,
    handle: Option<JoinHandle<()>>,
}

impl Persister {
    pub fn new<S: Store>(store: S) -> Self {
        let shared: Shared = Arc::new((Mutex::new(Slot::default()), Condvar::new()));
        let worker = Arc::clone(&shared);
        let handle = thread::spawn(move || write_loop(store, worker));
        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Queue `data` for writing, never blocking on disk
    pub fn save(&self, data: Data) {
        let mut slot = lock(&self.shared);
        if slot.closed {
            return;
        }
        if slot.pending.replace(data).is_some() {
            debug!("replaced pending state snapshot");
        }
        self.shared.1.notify_one();
    }

    /// Flush the pending snapshot and stop the writer
    pub fn close(&mut self) {
        {
            let mut slot = lock(&self.shared);
            slot.closed = true;
            self.shared.1.notify_one();
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("state writer panicked");
            }
        }
    }
}

impl Drop for Persister {
    fn drop(&mut self) {
        self.close();
    }
}

fn write_loop<S: Store>(store: S, shared: Shared) {
    loop {
        let next = {
            let mut slot = lock(&shared);
            while slot.pending.is_none() && !slot.closed {
                slot = shared.1.wait(slot).unwrap_or_else(PoisonError::into_inner);
            }
            match slot.pending.take() {
                Some(data) => data,
                None => return,
            }
        };
        if let Err(e) = store.save(&next) {
            warn!("failed to save state: {e}");
        }
    }
}
