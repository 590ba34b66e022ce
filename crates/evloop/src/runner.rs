//! Self-hosted reactor: a named thread that owns and runs a loop.
//!
//! `EventLoopRunner` is the turnkey wrapper for the common deployment:
//! spawn one thread, give it a reactor, run until asked to stop. Work
//! reaches the loop thread through `exec_async`/`exec_sync` (closures
//! that receive the reactor, so they can register further handles) or
//! through the `Executor` impl for plain tasks.
//!
//! Stopping is ordered: the stop request itself runs on the loop thread,
//! force-closes every handle so their teardown abandons outstanding
//! waiters, then breaks the loop. After `stop()` returns (from any
//! thread but the loop's own), the thread has been joined.

use evloop_core::error::{LoopError, Result};
use evloop_core::executor::{Executor, Task};
use evloop_core::state::RunMode;
use evloop_core::{edebug, einfo};
use evloop_runtime::{promise, AsyncFn, Future, Reactor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

pub struct RunnerConfig {
    pub thread_name: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            thread_name: "evloop-runner".to_string(),
        }
    }
}

type RunnerTask = Box<dyn FnOnce(&Reactor) + Send>;

pub struct EventLoopRunner {
    reactor: Reactor,
    calls: Arc<AsyncFn<RunnerTask, ()>>,
    stopping: AtomicBool,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl EventLoopRunner {
    /// Spawn the loop thread and wait for its reactor to come up.
    pub fn new(config: RunnerConfig) -> Result<Self> {
        let (tx, rx) = mpsc::sync_channel(1);
        let name = config.thread_name.clone();

        let join = thread::Builder::new()
            .name(config.thread_name)
            .spawn(move || {
                let reactor = match Reactor::create() {
                    Ok(r) => r,
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        return;
                    }
                };
                let loop_ref = reactor.clone();
                let calls = match AsyncFn::new(&reactor, move |p, task: RunnerTask| {
                    task(&loop_ref);
                    p.set(());
                }) {
                    Ok(c) => Arc::new(c),
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        return;
                    }
                };
                if tx.send(Ok((reactor.clone(), calls))).is_err() {
                    return;
                }

                edebug!("runner '{}': loop starting", name);
                let _ = reactor.run(RunMode::UntilDone);
                // Anything still registered abandons its waiters here.
                reactor.shutdown_handles();
                edebug!("runner '{}': loop exited", name);
            })
            .expect("Failed to spawn runner thread");

        match rx.recv() {
            Ok(Ok((reactor, calls))) => Ok(Self {
                reactor,
                calls,
                stopping: AtomicBool::new(false),
                join: Mutex::new(Some(join)),
            }),
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            // Thread died before the handoff.
            Err(_) => {
                let _ = join.join();
                Err(LoopError::Closing)
            }
        }
    }

    /// The loop this runner drives. Handles may be registered on it from
    /// any thread; their callbacks run on the runner thread.
    pub fn reactor(&self) -> &Reactor {
        &self.reactor
    }

    /// Queue `f` on the loop thread. The future resolves once it ran,
    /// or with `()` immediately if the runner is stopping.
    pub fn exec_async<F>(&self, f: F) -> Future<()>
    where
        F: FnOnce(&Reactor) + Send + 'static,
    {
        if self.stopping.load(Ordering::Acquire) {
            let (p, fut) = promise();
            drop(p);
            return fut;
        }
        self.calls.call(Box::new(f))
    }

    /// Run `f` on the loop thread and block for its result. Called from
    /// the loop thread itself it runs inline, so loop callbacks may use
    /// it without deadlocking. Returns `T::default()` if the runner
    /// stopped before `f` could run.
    pub fn exec_sync<T, F>(&self, f: F) -> T
    where
        T: Send + Default + 'static,
        F: FnOnce(&Reactor) -> T + Send + 'static,
    {
        if self.reactor.is_loop_thread() {
            return f(&self.reactor);
        }
        let (p, fut) = promise();
        drop(self.exec_async(move |r| p.set(f(r))));
        fut.wait()
    }

    /// Stop the loop and join its thread. Idempotent; when invoked from
    /// a loop callback the join is skipped and the thread unwinds after
    /// the callback returns.
    pub fn stop(&self) {
        if !self.stopping.swap(true, Ordering::AcqRel) {
            einfo!("runner: stop requested");
            drop(self.calls.call(Box::new(|r: &Reactor| {
                r.walk(|h| h.force_close());
                r.stop();
            })));
        }
        if self.reactor.is_loop_thread() {
            return;
        }
        let handle = self.join.lock().unwrap().take();
        if let Some(j) = handle {
            let _ = j.join();
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }
}

impl Executor for EventLoopRunner {
    fn execute(&self, task: Task) {
        if self.stopping.load(Ordering::Acquire) {
            return;
        }
        drop(self.calls.call(Box::new(move |_: &Reactor| task())));
    }
}

impl Drop for EventLoopRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{InlineExecutor, SubmitExt};
    use evloop_core::id::current_tid;
    use evloop_runtime::Wakeup;
    use std::sync::atomic::{AtomicU64, AtomicUsize};
    use std::time::Duration;

    #[test]
    fn test_exec_sync_round_trip() {
        let runner = EventLoopRunner::new(RunnerConfig::default()).unwrap();
        let tid = runner.exec_sync(|_| current_tid());
        assert_ne!(tid, current_tid());
        assert_ne!(tid, 0);
        // Every call lands on the same thread.
        assert_eq!(runner.exec_sync(|_| current_tid()), tid);
        runner.stop();
    }

    #[test]
    fn test_exec_sync_from_loop_thread_runs_inline() {
        let runner = Arc::new(EventLoopRunner::new(RunnerConfig::default()).unwrap());
        let r2 = runner.clone();
        let nested = runner.exec_sync(move |_| {
            // Inline re-entry; a queued version would deadlock here.
            r2.exec_sync(|_| current_tid())
        });
        assert_eq!(nested, runner.exec_sync(|_| current_tid()));
        runner.stop();
    }

    #[test]
    fn test_handles_on_runner_loop() {
        let runner = EventLoopRunner::new(RunnerConfig::default()).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let h2 = hits.clone();
        let wakeup = runner.exec_sync(move |r| {
            Some(Arc::new(
                Wakeup::new(r, move || {
                    h2.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap(),
            ))
        });
        let wakeup = wakeup.unwrap();

        assert!(wakeup.raise());
        // Synchronize: anything queued after the raise drains after it.
        runner.exec_sync(|_| ());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        runner.stop();
    }

    #[test]
    fn test_submit_chain_binds_to_runner() {
        let runner = Arc::new(EventLoopRunner::new(RunnerConfig::default()).unwrap());
        let loop_tid = runner.exec_sync(|_| current_tid());

        let stage_tids = Arc::new(Mutex::new(Vec::new()));
        let (t1, t2) = (stage_tids.clone(), stage_tids.clone());
        let inline: Arc<dyn Executor> = Arc::new(InlineExecutor);

        let out = runner
            .submit(move || {
                t1.lock().unwrap().push(current_tid());
                10
            })
            .then(move |v| {
                t2.lock().unwrap().push(current_tid());
                v + 1
            })
            .via(inline)
            .then(|v| v * 2);

        assert_eq!(out.wait(), 22);
        let tids = stage_tids.lock().unwrap().clone();
        assert_eq!(tids, vec![loop_tid, loop_tid]);
        runner.stop();
    }

    #[test]
    fn test_three_stage_chain_thread_binding() {
        use crate::worker::{WorkerConfig, WorkerExecutor};

        let runner = Arc::new(EventLoopRunner::new(RunnerConfig::default()).unwrap());
        let worker = Arc::new(WorkerExecutor::new(WorkerConfig::default()));
        let inline: Arc<dyn Executor> = Arc::new(InlineExecutor);

        let loop_tid = runner.exec_sync(|_| current_tid());
        let worker_tid = worker.submit(|| current_tid()).wait();
        let caller_tid = current_tid();

        let loop_exec: Arc<dyn Executor> = runner.clone();
        let worker_exec: Arc<dyn Executor> = worker.clone();
        let tids = Arc::new(Mutex::new(Vec::new()));
        let (t1, t2, t3) = (tids.clone(), tids.clone(), tids.clone());

        let out = inline
            .submit(move || {
                t1.lock().unwrap().push(current_tid());
                1
            })
            // Default binding: still inline, i.e. the completing thread.
            .then(move |v| {
                t2.lock().unwrap().push(current_tid());
                v + 1
            })
            .via(loop_exec)
            .then(move |v| {
                t3.lock().unwrap().push(current_tid());
                v + 1
            })
            .via(worker_exec)
            .then(|v| (v + 1, current_tid()));

        let (v, last_tid) = out.wait();
        assert_eq!(v, 4);
        let got = tids.lock().unwrap().clone();
        assert_eq!(got, vec![caller_tid, caller_tid, loop_tid]);
        assert_eq!(last_tid, worker_tid);

        worker.shutdown();
        runner.stop();
    }

    #[test]
    fn test_stop_under_load_abandons_rest() {
        let runner = Arc::new(EventLoopRunner::new(RunnerConfig::default()).unwrap());
        let ran = Arc::new(AtomicU64::new(0));

        let mut futs = Vec::new();
        for _ in 0..64 {
            let r2 = ran.clone();
            futs.push(runner.exec_async(move |_| {
                thread::sleep(Duration::from_millis(1));
                r2.fetch_add(1, Ordering::SeqCst);
            }));
        }
        runner.stop();

        // Every future resolves: some ran, the rest were abandoned to
        // the default. None may hang.
        for f in futs {
            f.wait();
        }
        assert!(ran.load(Ordering::SeqCst) <= 64);

        // The runner refuses new work once stopped.
        let r2 = ran.clone();
        runner
            .exec_async(move |_| {
                r2.fetch_add(100, Ordering::SeqCst);
            })
            .wait();
        assert!(ran.load(Ordering::SeqCst) < 100);
    }

    #[test]
    fn test_stop_idempotent_and_from_drop() {
        let runner = EventLoopRunner::new(RunnerConfig::default()).unwrap();
        runner.stop();
        runner.stop();
        assert!(runner.is_stopping());
        assert_eq!(runner.exec_sync(|_| 7), 0);
        // Drop runs stop() again; must be a no-op.
    }
}
