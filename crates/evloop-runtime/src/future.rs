//! Write-once promise/future pairs with executor-bound continuations.
//!
//! A `Future` transitions at most once from pending to a terminal state.
//! Abandonment (the producing side dropped without setting a value) is a
//! normal outcome and resolves to `T::default()` — by design a waiter
//! cannot distinguish "completed with the default" from "never ran";
//! callers needing strict failure detection listen to the relevant error
//! signal instead.
//!
//! Continuations are pure data flow: `then()` hands the resolved value to
//! the next stage on the executor the future is bound to (the one that
//! produced it via `submit`, or whatever `via()` rebound it to). With no
//! binding the stage runs inline on whichever thread completed the value.
//! The state lock is never held while a continuation or executor runs.

use evloop_core::executor::{Executor, Task};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

struct Inner<T> {
    /// Terminal once true; `value` empty at that point means the value
    /// was consumed (waited or handed to a continuation).
    done: bool,
    value: Option<T>,
    continuation: Option<Box<dyn FnOnce(T) + Send>>,
}

pub(crate) struct FutureState<T> {
    inner: Mutex<Inner<T>>,
    cv: Condvar,
}

impl<T: Send + Default + 'static> FutureState<T> {
    fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                done: false,
                value: None,
                continuation: None,
            }),
            cv: Condvar::new(),
        }
    }

    /// Resolve. First write wins; later writes are ignored.
    fn complete(&self, value: T) {
        let mut g = self.inner.lock().unwrap();
        if g.done {
            return;
        }
        g.done = true;
        if let Some(cont) = g.continuation.take() {
            drop(g);
            cont(value);
        } else {
            g.value = Some(value);
            self.cv.notify_all();
        }
    }
}

/// Allocate a connected promise/future pair.
pub fn promise<T: Send + Default + 'static>() -> (Promise<T>, Future<T>) {
    let (st, fut) = state_pair();
    (Promise { st }, fut)
}

pub(crate) fn state_pair<T: Send + Default + 'static>() -> (Arc<FutureState<T>>, Future<T>) {
    let st = Arc::new(FutureState::new());
    (
        st.clone(),
        Future {
            st,
            exec: None,
        },
    )
}

/// Write-once producing half.
pub struct Promise<T: Send + Default + 'static> {
    st: Arc<FutureState<T>>,
}

impl<T: Send + Default + 'static> Promise<T> {
    pub(crate) fn from_state(st: Arc<FutureState<T>>) -> Self {
        Self { st }
    }

    /// Resolve the paired future. No-op if already resolved.
    pub fn set(self, value: T) {
        self.st.complete(value);
    }
}

impl<T: Send + Default + 'static> Drop for Promise<T> {
    fn drop(&mut self) {
        // Unset promise going away: resolve to the default so waiters
        // never hang on an abandoned request.
        self.st.complete(T::default());
    }
}

/// Consuming half. Not clonable; waiting or chaining consumes the value.
pub struct Future<T: Send + Default + 'static> {
    st: Arc<FutureState<T>>,
    exec: Option<Arc<dyn Executor>>,
}

impl<T: Send + Default + 'static> Future<T> {
    /// Block the calling thread until resolved.
    pub fn wait(self) -> T {
        let mut g = self.st.inner.lock().unwrap();
        loop {
            if g.done {
                return g.value.take().unwrap_or_default();
            }
            g = self.st.cv.wait(g).unwrap();
        }
    }

    /// Block up to `timeout`; `None` on expiry (the future stays usable).
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut g = self.st.inner.lock().unwrap();
        loop {
            if g.done {
                return Some(g.value.take().unwrap_or_default());
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self.st.cv.wait_timeout(g, deadline - now).unwrap();
            g = guard;
        }
    }

    /// Non-blocking probe.
    pub fn try_take(&mut self) -> Option<T> {
        let mut g = self.st.inner.lock().unwrap();
        if g.done {
            g.value.take()
        } else {
            None
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.st.inner.lock().unwrap().done
    }

    /// Rebind: subsequent `then` stages run on `exec`.
    pub fn via(mut self, exec: Arc<dyn Executor>) -> Self {
        self.exec = Some(exec);
        self
    }

    /// Chain a continuation. `f` receives the resolved value on this
    /// future's bound executor (inline on the completing thread if
    /// unbound) and its result resolves the returned future, which keeps
    /// the same binding.
    pub fn then<U, F>(self, f: F) -> Future<U>
    where
        U: Send + Default + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let exec = self.exec.clone();
        let (p, mut out) = promise::<U>();
        out.exec = exec.clone();

        let stage: Box<dyn FnOnce(T) + Send> = match exec {
            Some(e) => Box::new(move |v| {
                let task: Task = Box::new(move || p.set(f(v)));
                e.execute(task);
            }),
            None => Box::new(move |v| p.set(f(v))),
        };

        let mut g = self.st.inner.lock().unwrap();
        if g.done {
            let value = g.value.take();
            drop(g);
            if let Some(v) = value {
                stage(v);
            }
        } else {
            g.continuation = Some(stage);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::thread;

    #[test]
    fn test_set_then_wait() {
        let (p, fut) = promise::<i32>();
        p.set(41);
        assert_eq!(fut.wait(), 41);
    }

    #[test]
    fn test_wait_blocks_until_set() {
        let (p, fut) = promise::<i32>();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            p.set(7);
        });
        assert_eq!(fut.wait(), 7);
        t.join().unwrap();
    }

    #[test]
    fn test_promise_drop_resolves_default() {
        let (p, fut) = promise::<i32>();
        drop(p);
        assert_eq!(fut.wait(), 0);
    }

    #[test]
    fn test_wait_timeout_expires_and_recovers() {
        let (p, mut fut) = promise::<u32>();
        assert_eq!(fut.wait_timeout(Duration::from_millis(10)), None);
        p.set(3);
        assert_eq!(fut.wait_timeout(Duration::from_millis(10)), Some(3));
    }

    #[test]
    fn test_try_take() {
        let (p, mut fut) = promise::<String>();
        assert_eq!(fut.try_take(), None);
        p.set("done".to_string());
        assert_eq!(fut.try_take(), Some("done".to_string()));
        // Value consumed.
        assert_eq!(fut.try_take(), None);
    }

    #[test]
    fn test_then_on_resolved_runs_inline() {
        let (p, fut) = promise::<i32>();
        p.set(1);
        let tid = current_tid_of_stage(fut);
        assert_eq!(tid, evloop_core::id::current_tid());
    }

    fn current_tid_of_stage(fut: Future<i32>) -> u64 {
        let seen = Arc::new(AtomicU64::new(0));
        let seen2 = seen.clone();
        fut.then(move |_| {
            seen2.store(evloop_core::id::current_tid(), Ordering::SeqCst);
        })
        .wait();
        seen.load(Ordering::SeqCst)
    }

    #[test]
    fn test_then_on_pending_runs_on_completing_thread() {
        let (p, fut) = promise::<i32>();
        let out = fut.then(|v| v * 2);
        let t = thread::spawn(move || p.set(21));
        assert_eq!(out.wait(), 42);
        t.join().unwrap();
    }

    #[test]
    fn test_second_set_ignored() {
        let (p, fut) = promise::<i32>();
        let st = p.st.clone();
        p.set(5);
        st.complete(9);
        assert_eq!(fut.wait(), 5);
    }
}
