//! Cross-thread wakeup primitives.
//!
//! `Wakeup` carries no payload: raises made in quick succession before
//! the reactor drains may collapse into fewer handler invocations than
//! raises (at least 1, at most N — coalescing is the point, the use case
//! is "make the loop notice there is work", not "count notifications").
//!
//! `WakeupQueue<T>` carries payloads and gives the strong guarantee:
//! while the primitive is open every enqueued item is drained exactly
//! once, in enqueue order. The drain swaps the whole queue out under its
//! lock and invokes the handler item by item with no producer-visible
//! lock held, so a slow or re-raising handler never blocks producers.
//!
//! Close always wins: once teardown has run, no handler fires again. A
//! payload-less raise racing with close may be dropped outright (not
//! merely coalesced); payloads still queued at teardown are released
//! unprocessed — `AsyncFn` turns those into default-resolved futures.
//!
//! Both primitives honor the re-entrant fast path: a raise from the loop
//! thread itself invokes the handler synchronously, except when the
//! handler is already on the stack, in which case the raise falls back
//! to the queued path instead of deadlocking.

use crate::handle::HandleDriver;
use crate::reactor::{LoopShared, Reactor};
use evloop_core::error::Result;
use evloop_core::id::HandleId;
use evloop_core::signal::Signal;
use evloop_core::state::HandleState;
use std::collections::VecDeque;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

const ACTIVE: u8 = 0;
const CLOSING: u8 = 1;
const CLOSED: u8 = 2;

fn state_of(v: u8) -> HandleState {
    match v {
        ACTIVE => HandleState::Active,
        CLOSING => HandleState::Closing,
        _ => HandleState::Closed,
    }
}

// ── Payload-less wakeup ──────────────────────────────────────────────

struct WakeupInner {
    shared: Weak<LoopShared>,
    hid: OnceLock<HandleId>,
    state: AtomicU8,
    pending: AtomicBool,
    handler: Mutex<Box<dyn FnMut() + Send>>,
    closed: Signal<()>,
}

impl HandleDriver for WakeupInner {
    fn drain(&self) {
        if self.pending.swap(false, Ordering::AcqRel) {
            let mut h = self.handler.lock().unwrap();
            h();
        }
    }

    fn teardown(&self) {
        self.state.store(CLOSED, Ordering::Release);
        self.pending.store(false, Ordering::Release);
        self.closed.raise(&());
    }
}

/// Cross-thread signal without payload. Coalescing by design.
pub struct Wakeup {
    inner: Arc<WakeupInner>,
}

impl Wakeup {
    /// Register with `reactor`; the handler runs on the loop thread.
    /// Fails if the loop is already closing.
    pub fn new<F>(reactor: &Reactor, handler: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let inner = Arc::new(WakeupInner {
            shared: Arc::downgrade(reactor.shared()),
            hid: OnceLock::new(),
            state: AtomicU8::new(ACTIVE),
            pending: AtomicBool::new(false),
            handler: Mutex::new(Box::new(handler)),
            closed: Signal::new(),
        });
        let hid = reactor.shared().register(inner.clone())?;
        let _ = inner.hid.set(hid);
        Ok(Self { inner })
    }

    /// Ask the loop thread to invoke the handler. Returns false when the
    /// raise was silently skipped (primitive or loop going away).
    ///
    /// On the loop thread the handler runs synchronously before this
    /// returns.
    pub fn raise(&self) -> bool {
        let inner = &self.inner;
        let Some(shared) = inner.shared.upgrade() else {
            return false;
        };
        if inner.state.load(Ordering::Acquire) != ACTIVE {
            return false;
        }

        if shared.is_loop_thread() {
            // Fast path; falls through to the flag if the handler is
            // already running (re-entrant raise).
            if let Ok(mut h) = inner.handler.try_lock() {
                h();
                return true;
            }
        }

        // Only the false→true edge schedules a wake: later raises ride
        // along with the already-pending one.
        if !inner.pending.swap(true, Ordering::AcqRel) {
            if let Some(&hid) = inner.hid.get() {
                shared.signal_wake(hid);
            }
        }
        true
    }

    /// Idempotent asynchronous close.
    pub fn close(&self) {
        close_common(&self.inner.shared, &self.inner.hid, &self.inner.state);
    }

    pub fn state(&self) -> HandleState {
        state_of(self.inner.state.load(Ordering::Acquire))
    }

    /// Register a callback fired (on the loop thread) once teardown has
    /// been confirmed.
    pub fn on_closed<F>(&self, cb: F)
    where
        F: Fn(&()) + Send + Sync + 'static,
    {
        self.inner.closed.connect(cb);
    }
}

impl Drop for Wakeup {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Payload-carrying wakeup ──────────────────────────────────────────

struct QueueInner<T: Send + 'static> {
    shared: Weak<LoopShared>,
    hid: OnceLock<HandleId>,
    state: AtomicU8,
    pending: AtomicBool,
    queue: Mutex<VecDeque<T>>,
    handler: Mutex<Box<dyn FnMut(T) + Send>>,
    closed: Signal<()>,
}

impl<T: Send + 'static> HandleDriver for QueueInner<T> {
    fn drain(&self) {
        // Clear the schedule flag before swapping so a producer racing
        // with the swap re-signals rather than getting lost.
        self.pending.store(false, Ordering::Release);
        let batch = {
            let mut q = self.queue.lock().unwrap();
            mem::take(&mut *q)
        };
        if batch.is_empty() {
            return;
        }
        let mut h = self.handler.lock().unwrap();
        for item in batch {
            h(item);
        }
    }

    fn teardown(&self) {
        self.state.store(CLOSED, Ordering::Release);
        self.pending.store(false, Ordering::Release);
        // Release still-queued payloads unprocessed.
        let dropped = {
            let mut q = self.queue.lock().unwrap();
            mem::take(&mut *q)
        };
        drop(dropped);
        self.closed.raise(&());
    }
}

/// Cross-thread signal with an ordered payload queue.
pub struct WakeupQueue<T: Send + 'static> {
    inner: Arc<QueueInner<T>>,
}

impl<T: Send + 'static> WakeupQueue<T> {
    pub fn new<F>(reactor: &Reactor, handler: F) -> Result<Self>
    where
        F: FnMut(T) + Send + 'static,
    {
        let inner = Arc::new(QueueInner {
            shared: Arc::downgrade(reactor.shared()),
            hid: OnceLock::new(),
            state: AtomicU8::new(ACTIVE),
            pending: AtomicBool::new(false),
            queue: Mutex::new(VecDeque::new()),
            handler: Mutex::new(Box::new(handler)),
            closed: Signal::new(),
        });
        let hid = reactor.shared().register(inner.clone())?;
        let _ = inner.hid.set(hid);
        Ok(Self { inner })
    }

    /// Deliver `item` to the loop-thread handler. Returns false when the
    /// item was silently dropped (primitive closing or loop gone) — the
    /// caller owns the fallout, e.g. abandoning a correlated request.
    pub fn raise(&self, item: T) -> bool {
        let inner = &self.inner;
        let Some(shared) = inner.shared.upgrade() else {
            return false;
        };
        if inner.state.load(Ordering::Acquire) != ACTIVE {
            return false;
        }

        if shared.is_loop_thread() {
            if let Ok(mut h) = inner.handler.try_lock() {
                h(item);
                return true;
            }
            // Re-entrant raise from inside the handler: queue it, it is
            // drained in a later pass of the same loop.
        }

        {
            let mut q = inner.queue.lock().unwrap();
            // Re-checked under the queue lock: teardown clears the queue
            // after flipping the state, so nothing can slip in behind it.
            if inner.state.load(Ordering::Acquire) != ACTIVE {
                return false;
            }
            q.push_back(item);
        }
        if !inner.pending.swap(true, Ordering::AcqRel) {
            if let Some(&hid) = inner.hid.get() {
                shared.signal_wake(hid);
            }
        }
        true
    }

    pub fn close(&self) {
        close_common(&self.inner.shared, &self.inner.hid, &self.inner.state);
    }

    pub fn state(&self) -> HandleState {
        state_of(self.inner.state.load(Ordering::Acquire))
    }

    pub fn on_closed<F>(&self, cb: F)
    where
        F: Fn(&()) + Send + Sync + 'static,
    {
        self.inner.closed.connect(cb);
    }

    /// Items currently waiting to be drained.
    pub fn queued(&self) -> usize {
        self.inner.queue.lock().unwrap().len()
    }
}

impl<T: Send + 'static> Drop for WakeupQueue<T> {
    fn drop(&mut self) {
        self.close();
    }
}

fn close_common(shared: &Weak<LoopShared>, hid: &OnceLock<HandleId>, state: &AtomicU8) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    if state
        .compare_exchange(ACTIVE, CLOSING, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return; // double close is a no-op
    }
    if let Some(&hid) = hid.get() {
        shared.request_close(hid);
    }
}
