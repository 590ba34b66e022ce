//! Typed notification signals.
//!
//! A `Signal<T>` is an explicit callback-registration table used for
//! push-style notifications (reactor errors, handle closed). Callbacks
//! are invoked outside the table lock so a callback may connect further
//! callbacks or raise the signal again without deadlocking.

use std::sync::{Arc, Mutex};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A typed event channel with callback registration.
pub struct Signal<T> {
    slots: Mutex<Vec<Callback<T>>>,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
        }
    }

    /// Register a callback. All registered callbacks see every
    /// subsequent `raise()`.
    pub fn connect<F>(&self, f: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.slots.lock().unwrap().push(Arc::new(f));
    }

    /// Invoke every registered callback with `event`.
    pub fn raise(&self, event: &T) {
        // Snapshot under the lock, invoke outside it.
        let snapshot: Vec<Callback<T>> = self.slots.lock().unwrap().clone();
        for cb in snapshot {
            cb(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().unwrap().is_empty()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}
