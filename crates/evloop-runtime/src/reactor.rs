//! # Reactor — single-threaded signal dispatcher
//!
//! The reactor owns the loop backend and the handle registry. Exactly one
//! thread at a time may run it; that thread is recorded as the owner for
//! the duration of `run()` and every handle callback happens there:
//!
//! ```text
//! loop {
//!     1. Swap out the pending signal queue (wakes + closes)
//!     2. For each waked handle → driver.drain()        (outside locks)
//!     3. For each closing handle → remove + teardown() (outside locks)
//!     4. Stop requested? → return
//!     5. No handles left? → return (drained cleanly)
//!     6. Nothing happened? → backend.wait()
//! }
//! ```
//!
//! Producers never touch the registry directly; they append to the signal
//! queue under a narrow lock and poke the backend. The backend's wake is
//! sticky, so a signal arriving between step 1 and step 6 is never lost.

use crate::backend::default_backend;
use crate::handle::{HandleDriver, HandleRef};
use evloop_core::backend::LoopBackend;
use evloop_core::error::{LoopError, Result};
use evloop_core::id::{current_tid, HandleId};
use evloop_core::signal::Signal;
use evloop_core::state::{HandleState, RunMode};
use evloop_core::{edebug, einfo, ewarn};
use std::collections::HashMap;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

struct HandleEntry {
    state: HandleState,
    driver: Arc<dyn HandleDriver>,
}

#[derive(Default)]
struct SignalQueue {
    wakes: Vec<HandleId>,
    closes: Vec<HandleId>,
}

/// State shared between the run thread and producer threads.
pub struct LoopShared {
    backend: Box<dyn LoopBackend>,
    /// Thread currently inside `run()`; 0 when not running.
    owner: AtomicU64,
    stop: AtomicBool,
    closed: AtomicBool,
    next_handle: AtomicU64,
    registry: Mutex<HashMap<HandleId, HandleEntry>>,
    signals: Mutex<SignalQueue>,
    errors: Signal<LoopError>,
}

impl LoopShared {
    #[inline]
    pub(crate) fn is_loop_thread(&self) -> bool {
        self.owner.load(Ordering::Acquire) == current_tid()
    }

    /// Attach a driver. Fails once the loop is closed.
    pub(crate) fn register(&self, driver: Arc<dyn HandleDriver>) -> Result<HandleId> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LoopError::Closing);
        }
        let id = HandleId(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        self.registry.lock().unwrap().insert(
            id,
            HandleEntry {
                state: HandleState::Active,
                driver,
            },
        );
        Ok(id)
    }

    /// Producer side: mark `id` as having pending work and wake the loop.
    pub(crate) fn signal_wake(&self, id: HandleId) {
        self.signals.lock().unwrap().wakes.push(id);
        self.wake_backend();
    }

    /// Request asynchronous teardown of `id`. Idempotent: only the
    /// Active→Closing edge enqueues a close signal.
    pub(crate) fn request_close(&self, id: HandleId) {
        let first = {
            let mut reg = self.registry.lock().unwrap();
            match reg.get_mut(&id) {
                Some(e) if e.state.is_active() => {
                    e.state = HandleState::Closing;
                    true
                }
                _ => false,
            }
        };
        if first {
            self.signals.lock().unwrap().closes.push(id);
            self.wake_backend();
        }
    }

    fn wake_backend(&self) {
        if let Err(e) = self.backend.wake() {
            self.errors.raise(&e);
        }
    }

    fn open_handles(&self) -> usize {
        self.registry.lock().unwrap().len()
    }
}

/// Cheap clonable reference to a loop. All clones share the same state;
/// handles hold only weak references, so dropping every `Reactor` clone
/// releases the backend.
#[derive(Clone)]
pub struct Reactor {
    shared: Arc<LoopShared>,
}

impl Reactor {
    /// Allocate a loop on the platform default backend.
    pub fn create() -> Result<Self> {
        Ok(Self::with_backend(default_backend()?))
    }

    pub fn with_backend(backend: Box<dyn LoopBackend>) -> Self {
        edebug!("reactor: created (backend={})", backend.name());
        Self {
            shared: Arc::new(LoopShared {
                backend,
                owner: AtomicU64::new(0),
                stop: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                next_handle: AtomicU64::new(0),
                registry: Mutex::new(HashMap::new()),
                signals: Mutex::new(SignalQueue::default()),
                errors: Signal::new(),
            }),
        }
    }

    pub(crate) fn shared(&self) -> &Arc<LoopShared> {
        &self.shared
    }

    /// Run the loop on the calling thread.
    ///
    /// Returns `Ok(true)` when the loop drained cleanly (no handles left),
    /// `Ok(false)` when it returned with handles still registered (stop
    /// requested, or a single iteration mode). `Err(AlreadyRunning)` if
    /// another thread is inside `run()`.
    pub fn run(&self, mode: RunMode) -> Result<bool> {
        let s = &self.shared;
        let tid = current_tid();
        s.owner
            .compare_exchange(0, tid, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LoopError::AlreadyRunning)?;

        let drained = loop {
            let did_work = self.drain_signals();

            if s.stop.load(Ordering::Acquire) {
                break s.open_handles() == 0;
            }

            match mode {
                RunMode::NoWait => break s.open_handles() == 0,
                RunMode::Once => {
                    if did_work || s.open_handles() == 0 {
                        break s.open_handles() == 0;
                    }
                    s.backend.wait();
                    self.drain_signals();
                    break s.open_handles() == 0;
                }
                RunMode::UntilDone => {
                    if s.open_handles() == 0 {
                        break true;
                    }
                    if !did_work {
                        s.backend.wait();
                    }
                }
            }
        };

        // Stop applies to this run only.
        s.stop.store(false, Ordering::Release);
        s.owner.store(0, Ordering::Release);
        Ok(drained)
    }

    /// One dispatch pass. Signal queue is swapped out under its lock;
    /// drivers run with no reactor lock held.
    fn drain_signals(&self) -> bool {
        let s = &self.shared;
        let (wakes, closes) = {
            let mut q = s.signals.lock().unwrap();
            (mem::take(&mut q.wakes), mem::take(&mut q.closes))
        };
        let any = !wakes.is_empty() || !closes.is_empty();

        for id in wakes {
            let driver = {
                let reg = s.registry.lock().unwrap();
                reg.get(&id)
                    .filter(|e| e.state.is_active())
                    .map(|e| e.driver.clone())
            };
            if let Some(d) = driver {
                d.drain();
            }
        }

        for id in closes {
            let entry = { s.registry.lock().unwrap().remove(&id) };
            if let Some(e) = entry {
                e.driver.teardown();
            }
        }

        any
    }

    /// Ask the current (or next) `run()` to return at the next iteration
    /// boundary. Callable from any thread.
    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.wake_backend();
    }

    /// Refuse new handle registrations. If handles are still registered
    /// this reports `HandlesOpen` on the error signal instead of failing
    /// at the call site.
    pub fn close(&self) {
        let open = self.shared.open_handles();
        if open > 0 {
            ewarn!("reactor: close with {} handle(s) still open", open);
            self.shared.errors.raise(&LoopError::HandlesOpen(open));
            return;
        }
        self.shared.closed.store(true, Ordering::Release);
    }

    /// Visit every still-active handle. The registry lock is not held
    /// while `visit` runs, so the visitor may force-close handles.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(HandleRef<'_>),
    {
        let snapshot: Vec<(HandleId, HandleState)> = {
            let reg = self.shared.registry.lock().unwrap();
            reg.iter()
                .filter(|(_, e)| e.state.is_active())
                .map(|(id, e)| (*id, e.state))
                .collect()
        };
        for (id, state) in snapshot {
            visit(HandleRef {
                shared: &self.shared,
                id,
                state,
            });
        }
    }

    /// Force-teardown of every still-registered handle, active or
    /// closing. Used after the loop has exited so queued requests abandon
    /// instead of hanging their waiters. Also closes the loop.
    pub fn shutdown_handles(&self) {
        self.shared.closed.store(true, Ordering::Release);
        let mut torn = 0usize;
        loop {
            let entry = {
                let mut reg = self.shared.registry.lock().unwrap();
                let id = reg.keys().next().copied();
                id.and_then(|id| reg.remove(&id))
            };
            match entry {
                Some(e) => {
                    e.driver.teardown();
                    torn += 1;
                }
                None => break,
            }
        }
        if torn > 0 {
            einfo!("reactor: tore down {} leftover handle(s)", torn);
        }
    }

    /// Register a callback for push-style loop errors.
    pub fn on_error<F>(&self, cb: F)
    where
        F: Fn(&LoopError) + Send + Sync + 'static,
    {
        self.shared.errors.connect(cb);
    }

    /// True when called from the thread currently inside `run()`.
    pub fn is_loop_thread(&self) -> bool {
        self.shared.is_loop_thread()
    }

    /// Number of handles still in the Active state.
    pub fn active_handles(&self) -> usize {
        let reg = self.shared.registry.lock().unwrap();
        reg.values().filter(|e| e.state.is_active()).count()
    }
}
