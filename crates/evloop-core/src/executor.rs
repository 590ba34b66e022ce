//! Executor abstraction.
//!
//! An `Executor` runs opaque tasks in a defined execution context. The
//! trait is deliberately object-safe: futures carry an
//! `Arc<dyn Executor>` binding so continuation stages can be rebound
//! with `via()` without knowing the concrete type.
//!
//! # Implementors
//!
//! - `InlineExecutor`: runs the task synchronously on the calling thread.
//! - `ReactorExecutor`: tasks always run on the reactor thread.
//! - `WorkerExecutor`: tasks always run on one fixed background thread.

/// An opaque unit of work.
pub type Task = Box<dyn FnOnce() + Send>;

/// Runs tasks in a defined execution context.
///
/// **Contract:**
/// - `execute()` is callable from any thread and must not run the task
///   while holding any executor-internal lock.
/// - Ordering: tasks submitted from a single thread run in submission
///   order on any executor that serializes execution (reactor, worker).
/// - After the backing context is gone (loop stopped, worker shut
///   down), `execute()` degrades to a silent drop; any promise the task
///   owned resolves to its default through the promise-drop path.
pub trait Executor: Send + Sync {
    /// Submit a task for execution. Never blocks indefinitely.
    fn execute(&self, task: Task);
}
