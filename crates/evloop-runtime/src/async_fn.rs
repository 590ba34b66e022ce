//! Loop-thread function callable from anywhere.
//!
//! An `AsyncFn` pairs a payload queue with a correlator: `call()` files
//! the arguments under a fresh request id and returns the paired future
//! immediately. On the reactor thread the function receives the promise
//! for that id plus the arguments, and resolves it whenever it likes
//! (synchronously, or stashed and resolved from a later callback).
//!
//! Once the function is closed, or the loop tears it down, every
//! outstanding and future call resolves to `R::default()` instead of
//! hanging its waiter.

use crate::correlate::Correlator;
use crate::future::{promise, Future};
use crate::reactor::Reactor;
use crate::wakeup::WakeupQueue;
use evloop_core::error::Result;
use evloop_core::id::RequestId;
use evloop_core::state::HandleState;
use std::sync::Arc;

pub struct AsyncFn<A, R>
where
    A: Send + 'static,
    R: Send + Default + 'static,
{
    queue: WakeupQueue<(u64, A)>,
    corr: Arc<Correlator<R>>,
}

impl<A, R> AsyncFn<A, R>
where
    A: Send + 'static,
    R: Send + Default + 'static,
{
    /// Register on `reactor`. `func` runs on the loop thread, once per
    /// delivered call, and owns the promise for that call.
    pub fn new<F>(reactor: &Reactor, mut func: F) -> Result<Self>
    where
        F: FnMut(crate::future::Promise<R>, A) + Send + 'static,
    {
        let corr = Arc::new(Correlator::new());

        let c2 = corr.clone();
        let queue = WakeupQueue::new(reactor, move |(id, args): (u64, A)| {
            // An id with no slot was already abandoned; skip it.
            if let Some(p) = c2.take_promise(RequestId(id)) {
                func(p, args);
            }
        })?;

        // Loop-side teardown (walk + force_close, shutdown_handles)
        // abandons waiters the same way an explicit close() does.
        let c3 = corr.clone();
        queue.on_closed(move |_| c3.abandon_all());

        Ok(Self { queue, corr })
    }

    /// Invoke from any thread. The returned future resolves with the
    /// function's answer, or with `R::default()` if the call never ran.
    pub fn call(&self, args: A) -> Future<R> {
        if !self.queue.state().is_active() {
            let (p, fut) = promise();
            drop(p);
            return fut;
        }
        let (id, fut) = self.corr.create();
        if !self.queue.raise((id.raw(), args)) {
            // Raise lost the race with close: reclaim the slot so the
            // future resolves now instead of waiting for abandon_all.
            if let Some(p) = self.corr.take_promise(id) {
                drop(p);
            }
        }
        fut
    }

    /// Stop accepting calls and default-resolve everything outstanding.
    pub fn close(&self) {
        self.queue.close();
        self.corr.abandon_all();
    }

    pub fn state(&self) -> HandleState {
        self.queue.state()
    }

    /// Calls filed but not yet answered.
    pub fn outstanding(&self) -> usize {
        self.corr.outstanding()
    }
}

impl<A, R> Drop for AsyncFn<A, R>
where
    A: Send + 'static,
    R: Send + Default + 'static,
{
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evloop_core::state::RunMode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_cross_thread_call_round_trip() {
        let reactor = Reactor::create().unwrap();
        let add_one = Arc::new(
            AsyncFn::new(&reactor, |p, x: i32| {
                p.set(x + 1);
            })
            .unwrap(),
        );

        let f = add_one.clone();
        let r2 = reactor.clone();
        let caller = thread::spawn(move || {
            let got = f.call(5).wait();
            r2.stop();
            got
        });

        reactor.run(RunMode::UntilDone).unwrap();
        assert_eq!(caller.join().unwrap(), 6);
    }

    #[test]
    fn test_deferred_promise_resolution() {
        let reactor = Reactor::create().unwrap();
        // The function parks the promise and answers on a later call.
        let parked: Arc<std::sync::Mutex<Vec<crate::future::Promise<i32>>>> =
            Arc::new(std::sync::Mutex::new(Vec::new()));
        let p2 = parked.clone();
        let f = AsyncFn::new(&reactor, move |p, flush: bool| {
            if flush {
                for held in p2.lock().unwrap().drain(..) {
                    held.set(99);
                }
                p.set(0);
            } else {
                p2.lock().unwrap().push(p);
            }
        })
        .unwrap();

        let mut first = f.call(false);
        reactor.run(RunMode::NoWait).unwrap();
        assert!(!first.is_resolved());

        let second = f.call(true);
        reactor.run(RunMode::NoWait).unwrap();
        assert_eq!(first.try_take(), Some(99));
        assert_eq!(second.wait(), 0);
    }

    #[test]
    fn test_close_before_drain_defaults_pending() {
        let reactor = Reactor::create().unwrap();
        let ran = Arc::new(AtomicUsize::new(0));
        let r2 = ran.clone();
        let f = AsyncFn::new(&reactor, move |p, x: i32| {
            r2.fetch_add(1, Ordering::SeqCst);
            p.set(x);
        })
        .unwrap();

        // Filed but never drained.
        let fut = f.call(7);
        f.close();
        assert_eq!(fut.wait(), 0);
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        reactor.run(RunMode::UntilDone).unwrap();
        assert_eq!(f.state(), HandleState::Closed);
    }

    #[test]
    fn test_call_after_close_resolves_default() {
        let reactor = Reactor::create().unwrap();
        let f = AsyncFn::new(&reactor, |p, x: i32| p.set(x * 2)).unwrap();
        f.close();
        assert_eq!(f.call(21).wait(), 0);
        assert_eq!(f.outstanding(), 0);
        reactor.run(RunMode::UntilDone).unwrap();
    }

    #[test]
    fn test_loop_side_teardown_abandons_waiters() {
        let reactor = Reactor::create().unwrap();
        let f = Arc::new(
            AsyncFn::new(&reactor, |p, ms: u64| {
                thread::sleep(Duration::from_millis(ms));
                p.set(1);
            })
            .unwrap(),
        );

        // File a call, then have the reactor tear everything down without
        // ever draining it.
        let fut = f.call(0);
        reactor.shutdown_handles();
        assert_eq!(fut.wait(), 0);
        assert_eq!(f.outstanding(), 0);
    }

    #[test]
    fn test_reentrant_call_from_loop_thread() {
        let reactor = Reactor::create().unwrap();
        let double: Arc<std::sync::OnceLock<Arc<AsyncFn<i32, i32>>>> =
            Arc::new(std::sync::OnceLock::new());

        let d2 = double.clone();
        let outer = AsyncFn::new(&reactor, move |p, x: i32| {
            // A call on the loop thread runs synchronously.
            let inner = d2.get().unwrap().call(x).wait();
            p.set(inner + 1);
        })
        .unwrap();
        let _ = double.set(Arc::new(
            AsyncFn::new(&reactor, |p, x: i32| p.set(x * 2)).unwrap(),
        ));

        let fut = outer.call(10);
        let r2 = reactor.clone();
        let waiter = thread::spawn(move || {
            let got = fut.wait();
            r2.stop();
            got
        });
        reactor.run(RunMode::UntilDone).unwrap();
        assert_eq!(waiter.join().unwrap(), 21);
    }
}
