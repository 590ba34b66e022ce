//! Executor bindings for futures and closures.
//!
//! `Executor` (from `evloop-core`) is one method: run this task,
//! somewhere. The bindings here decide where:
//!
//! - [`InlineExecutor`] runs the task on the calling thread, before
//!   `execute` returns. Useful for tests and for pipeline stages that
//!   are cheap enough to run wherever the value appears.
//! - [`ReactorExecutor`] ships the task to a reactor you drive
//!   yourself; every task runs serialized on the loop thread.
//! - [`crate::WorkerExecutor`] and [`crate::EventLoopRunner`] bind to
//!   their own dedicated threads.
//!
//! [`SubmitExt::submit`] is the entry into a chain: it runs a closure on
//! the executor and hands back a future already bound to it, so `then`
//! stages stay on that executor until `via` rebinds them.

use evloop_core::error::Result;
use evloop_core::executor::{Executor, Task};
use evloop_runtime::{promise, AsyncFn, Future, Reactor};
use std::sync::Arc;

/// Runs tasks synchronously on whichever thread calls `execute`.
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, task: Task) {
        task();
    }
}

/// Serializes tasks onto a reactor's loop thread.
///
/// The caller drives the reactor; tasks queued here run during its
/// drain passes, in submission order per producer.
pub struct ReactorExecutor {
    calls: AsyncFn<Task, ()>,
}

impl ReactorExecutor {
    pub fn new(reactor: &Reactor) -> Result<Self> {
        let calls = AsyncFn::new(reactor, |p, task: Task| {
            task();
            p.set(());
        })?;
        Ok(Self { calls })
    }

    /// Detach from the reactor. Queued tasks that have not drained are
    /// dropped; tasks submitted afterwards are silently discarded.
    pub fn close(&self) {
        self.calls.close();
    }
}

impl Executor for ReactorExecutor {
    fn execute(&self, task: Task) {
        // The per-call completion future is not surfaced here; chains
        // that need one go through submit().
        drop(self.calls.call(task));
    }
}

/// Closure submission with a bound future, for any executor behind an
/// `Arc`.
pub trait SubmitExt {
    /// Run `f` on this executor; the returned future resolves with its
    /// result and is bound to this executor, so `then` stages run here
    /// too until `via` rebinds them.
    fn submit<T, F>(&self, f: F) -> Future<T>
    where
        T: Send + Default + 'static,
        F: FnOnce() -> T + Send + 'static;
}

impl SubmitExt for Arc<dyn Executor> {
    fn submit<T, F>(&self, f: F) -> Future<T>
    where
        T: Send + Default + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (p, fut) = promise();
        self.execute(Box::new(move || p.set(f())));
        fut.via(self.clone())
    }
}

impl<E: Executor + 'static> SubmitExt for Arc<E> {
    fn submit<T, F>(&self, f: F) -> Future<T>
    where
        T: Send + Default + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (p, fut) = promise();
        self.execute(Box::new(move || p.set(f())));
        fut.via(self.clone() as Arc<dyn Executor>)
    }
}
