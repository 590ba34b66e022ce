//! Dedicated single-thread executor with a bounded lock-free inbox.

use crossbeam_queue::ArrayQueue;
use evloop_core::executor::{Executor, Task};
use evloop_core::{edebug, einfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

pub struct WorkerConfig {
    /// Bounded inbox size; `execute` spins (yielding) while full.
    pub queue_capacity: usize,
    pub thread_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            thread_name: "evloop-worker".to_string(),
        }
    }
}

struct WorkerShared {
    inbox: ArrayQueue<Task>,
    running: AtomicBool,
    /// Parking latch: set after every push and on shutdown.
    nudged: Mutex<bool>,
    cv: Condvar,
}

/// Owns one named OS thread that drains the inbox in FIFO order.
///
/// Tasks submitted after shutdown are dropped; tasks already in the
/// inbox when shutdown starts still run before the thread exits.
pub struct WorkerExecutor {
    shared: Arc<WorkerShared>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerExecutor {
    pub fn new(config: WorkerConfig) -> Self {
        let shared = Arc::new(WorkerShared {
            inbox: ArrayQueue::new(config.queue_capacity),
            running: AtomicBool::new(true),
            nudged: Mutex::new(false),
            cv: Condvar::new(),
        });

        let s2 = shared.clone();
        let name = config.thread_name.clone();
        let join = thread::Builder::new()
            .name(config.thread_name)
            .spawn(move || {
                edebug!("worker '{}': started", name);
                worker_main(&s2);
                edebug!("worker '{}': exited", name);
            })
            .expect("Failed to spawn worker thread");

        Self {
            shared,
            join: Mutex::new(Some(join)),
        }
    }

    /// Stop the thread after it drains what is already queued.
    /// Idempotent; safe to call from a task running on the worker.
    pub fn shutdown(&self) {
        if self.shared.running.swap(false, Ordering::AcqRel) {
            let mut nudged = self.shared.nudged.lock().unwrap();
            *nudged = true;
            self.shared.cv.notify_one();
            drop(nudged);
            einfo!("worker: shutdown requested");
        }
        let handle = self.join.lock().unwrap().take();
        if let Some(j) = handle {
            if j.thread().id() == thread::current().id() {
                return; // shutdown from our own task: the loop unwinds itself
            }
            let _ = j.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }
}

impl Executor for WorkerExecutor {
    fn execute(&self, task: Task) {
        let mut task = task;
        loop {
            if !self.shared.running.load(Ordering::Acquire) {
                return; // dropped, same contract as a closed handle
            }
            match self.shared.inbox.push(task) {
                Ok(()) => break,
                Err(back) => {
                    // Inbox full: back off and let the worker catch up.
                    task = back;
                    thread::yield_now();
                }
            }
        }
        let mut nudged = self.shared.nudged.lock().unwrap();
        *nudged = true;
        self.shared.cv.notify_one();
    }
}

impl Drop for WorkerExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_main(s: &WorkerShared) {
    loop {
        while let Some(task) = s.inbox.pop() {
            task();
        }
        if !s.running.load(Ordering::Acquire) {
            break;
        }
        let mut nudged = s.nudged.lock().unwrap();
        while !*nudged {
            nudged = s.cv.wait(nudged).unwrap();
        }
        *nudged = false;
    }
    // Final drain: everything accepted before shutdown still runs.
    while let Some(task) = s.inbox.pop() {
        task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SubmitExt;
    use evloop_core::id::current_tid;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_runs_on_its_own_thread() {
        let w = Arc::new(WorkerExecutor::new(WorkerConfig::default()));
        let tid = w.submit(|| current_tid()).wait();
        assert_ne!(tid, current_tid());
        assert_ne!(tid, 0);
        w.shutdown();
    }

    #[test]
    fn test_fifo_per_producer() {
        let w = Arc::new(WorkerExecutor::new(WorkerConfig::default()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..100 {
            let s2 = seen.clone();
            w.execute(Box::new(move || s2.lock().unwrap().push(i)));
        }
        w.shutdown();
        let got = seen.lock().unwrap().clone();
        assert_eq!(got, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_shutdown_drains_queued_tasks() {
        let w = WorkerExecutor::new(WorkerConfig {
            queue_capacity: 8,
            thread_name: "drain-test".to_string(),
        });
        let ran = Arc::new(AtomicUsize::new(0));
        // A slow first task so later ones are still queued at shutdown.
        w.execute(Box::new(|| thread::sleep(Duration::from_millis(50))));
        for _ in 0..5 {
            let r2 = ran.clone();
            w.execute(Box::new(move || {
                r2.fetch_add(1, Ordering::SeqCst);
            }));
        }
        w.shutdown();
        assert_eq!(ran.load(Ordering::SeqCst), 5);

        // Post-shutdown submissions are dropped.
        let r2 = ran.clone();
        w.execute(Box::new(move || {
            r2.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_chain_stays_on_worker() {
        let w = Arc::new(WorkerExecutor::new(WorkerConfig::default()));
        let first = Arc::new(AtomicUsize::new(0));
        let f2 = first.clone();
        let out = w
            .submit(move || {
                f2.store(current_tid() as usize, Ordering::SeqCst);
                3
            })
            .then(move |v| (v * 2, current_tid()));
        let (v, then_tid) = out.wait();
        assert_eq!(v, 6);
        assert_eq!(then_tid as usize, first.load(Ordering::SeqCst));
        w.shutdown();
    }
}
