//! Request correlation: monotonic ids mapped to pending result slots.
//!
//! A `Correlator` hands out a fresh id plus a still-pending future per
//! call, and later pairs the id back to a write-once promise on the
//! reactor thread. The mapping only holds outstanding requests: taking
//! the promise removes the entry, so an id is in flight at most once and
//! the map is bounded by the number of unfinished calls.

use crate::future::{state_pair, Future, FutureState, Promise};
use evloop_core::id::RequestId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub struct Correlator<T: Send + Default + 'static> {
    next: AtomicU64,
    slots: Mutex<HashMap<u64, Arc<FutureState<T>>>>,
}

impl<T: Send + Default + 'static> Correlator<T> {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate a fresh id and its pending slot. Thread-safe; ids are
    /// strictly increasing and never reused.
    pub fn create(&self) -> (RequestId, Future<T>) {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let (st, fut) = state_pair();
        self.slots.lock().unwrap().insert(id, st);
        (RequestId(id), fut)
    }

    /// Bind a write-once promise to `id`, removing it from the mapping.
    /// `None` if the id was already fulfilled or abandoned.
    pub fn take_promise(&self, id: RequestId) -> Option<Promise<T>> {
        self.slots
            .lock()
            .unwrap()
            .remove(&id.raw())
            .map(Promise::from_state)
    }

    /// Forced teardown: every outstanding slot resolves to the default.
    pub fn abandon_all(&self) {
        let drained: Vec<Arc<FutureState<T>>> = {
            let mut slots = self.slots.lock().unwrap();
            slots.drain().map(|(_, st)| st).collect()
        };
        for st in drained {
            // Dropping an unset promise is the abandonment path.
            drop(Promise::from_state(st));
        }
    }

    pub fn outstanding(&self) -> usize {
        self.slots.lock().unwrap().len()
    }
}

impl<T: Send + Default + 'static> Default for Correlator<T> {
    fn default() -> Self {
        Self::new()
    }
}
