//! # evloop-runtime — the single-threaded reactor and its primitives
//!
//! Implements the execution core declared in `evloop-core`:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Producer threads (any number)           │
//! │     Wakeup::raise   WakeupQueue::raise   AsyncFn::call  │
//! └─────────────────────────────────────────────────────────┘
//!                │ queue under narrow lock │ backend.wake()
//!                ▼                         ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │            Reactor thread (exactly one at a time)       │
//! │   run() → drain signals → handle drivers → callbacks    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! All reactor-bound callbacks are serialized on the thread that called
//! `Reactor::run()`. Producers only ever touch the pending queues and the
//! id→slot map, each behind its own narrow-scope lock that is never held
//! while user closures run or waiters are woken.

pub mod async_fn;
pub mod backend;
pub mod correlate;
pub mod future;
pub mod handle;
pub mod reactor;
pub mod wakeup;

pub use async_fn::AsyncFn;
pub use backend::{default_backend, CondvarBackend};
pub use correlate::Correlator;
pub use future::{promise, Future, Promise};
pub use handle::{HandleDriver, HandleRef};
pub use reactor::Reactor;
pub use wakeup::{Wakeup, WakeupQueue};

#[cfg(unix)]
pub use backend::EventFdBackend;
