//! # evloop-core — Trait definitions for the evloop execution core
//!
//! This crate defines the trait boundaries for every axis of variability
//! in the evloop system, plus the shared error taxonomy and ids.
//! Default (safe) implementations of every trait live in `evloop-runtime`
//! and `evloop`; nothing here depends on a concrete implementation.
//!
//! ## Design principle
//!
//! > "Program to the interface. Start safe. Optimize with a new impl,
//! >  not by modifying the existing one."
//!
//! The reactor, the wakeup primitives and the executors all talk to each
//! other through traits from this crate, never through concrete types.

pub mod backend;
pub mod elog;
pub mod error;
pub mod executor;
pub mod id;
pub mod signal;
pub mod state;

pub use backend::LoopBackend;
pub use error::{LoopError, Result};
pub use executor::{Executor, Task};
pub use id::{current_tid, HandleId, RequestId};
pub use signal::Signal;
pub use state::{HandleState, RunMode};
