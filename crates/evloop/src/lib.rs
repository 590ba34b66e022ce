//! # evloop - Cross-Thread Execution Core
//!
//! A small execution core for programs that funnel work onto dedicated
//! threads: a single-threaded reactor with coalescing wakeups, write-once
//! promise/future pairs with executor-bound continuation chaining, and a
//! family of executors to bind stages to.
//!
//! ## Quick Start
//!
//! ```ignore
//! use evloop::{EventLoopRunner, RunnerConfig, SubmitExt};
//! use std::sync::Arc;
//!
//! fn main() {
//!     // One named thread owning one reactor.
//!     let runner = Arc::new(EventLoopRunner::new(RunnerConfig::default()).unwrap());
//!
//!     // Fire-and-forget onto the loop thread.
//!     runner.exec_async(|_| println!("on the loop thread"));
//!
//!     // Round trip with a result.
//!     let answer = runner.exec_sync(|_| 41 + 1);
//!     assert_eq!(answer, 42);
//!
//!     // Futures chain across executors.
//!     let out = runner
//!         .submit(|| expensive_parse())      // on the loop thread
//!         .then(|v| v.len())                 // still on the loop thread
//!         .wait();                           // caller blocks for the result
//!
//!     runner.stop();
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Caller threads                        │
//! │     submit() / exec_async() / AsyncFn::call / raise()       │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Reactor (one thread at a time)              │
//! │     wakeups → queues → correlated promises → callbacks      │
//! └─────────────────────────────────────────────────────────────┘
//!          │                    │                    │
//!          ▼                    ▼                    ▼
//!    ┌───────────┐       ┌───────────┐       ┌────────────┐
//!    │  Inline   │       │  Worker   │       │   Runner   │
//!    │ Executor  │       │ Executor  │       │ (own loop) │
//!    └───────────┘       └───────────┘       └────────────┘
//!        continuation stages land wherever `via()` binds them
//! ```
//!
//! ## Environment Variables
//!
//! - `EVL_LOG_LEVEL` - log level (off, error, warn, info, debug, trace)
//! - `EVL_FLUSH_EPRINT=1` - flush diagnostics immediately

pub mod executor;
pub mod runner;
pub mod worker;

// Re-export core types
pub use evloop_core::backend::LoopBackend;
pub use evloop_core::error::{LoopError, Result};
pub use evloop_core::executor::{Executor, Task};
pub use evloop_core::id::{HandleId, RequestId};
pub use evloop_core::signal::Signal;
pub use evloop_core::state::{HandleState, RunMode};

// Re-export logging macros
pub use evloop_core::elog::{init as init_logging, set_flush_enabled, set_log_level, LogLevel};
pub use evloop_core::{edebug, eerror, einfo, etrace, ewarn};

// Re-export runtime types
pub use evloop_runtime::{
    default_backend, promise, AsyncFn, CondvarBackend, Correlator, Future, HandleDriver,
    HandleRef, Promise, Reactor, Wakeup, WakeupQueue,
};
#[cfg(unix)]
pub use evloop_runtime::EventFdBackend;

pub use executor::{InlineExecutor, ReactorExecutor, SubmitExt};
pub use runner::{EventLoopRunner, RunnerConfig};
pub use worker::{WorkerConfig, WorkerExecutor};
