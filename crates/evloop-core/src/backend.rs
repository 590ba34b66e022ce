//! Loop backend abstraction.
//!
//! A `LoopBackend` is the one OS-facing primitive the reactor needs: a
//! cross-thread-safe "wake me up" signal paired with a blocking wait on
//! the reactor thread. Everything else (handle registry, signal
//! dispatch, walk/close) lives in the reactor itself.
//!
//! # Implementors
//!
//! - `EventFdBackend` (unix default): writes 1 to an eventfd, waits with
//!   `poll(2)` + read. Counter semantics coalesce bursts of wakes.
//!
//! - `CondvarBackend` (portable fallback): Mutex<bool> + Condvar.

use crate::error::Result;

/// Cross-thread wake + reactor-thread wait.
///
/// **Contract:**
/// - `wake()` must NEVER block and is callable from any thread.
/// - Wakes are sticky: a `wake()` issued at any point before `wait()`
///   is entered causes that `wait()` to return immediately. Multiple
///   wakes before a `wait()` return coalesce into one.
/// - `wait()` is only ever called by the thread running the loop and
///   consumes the pending-wake state before returning.
pub trait LoopBackend: Send + Sync {
    /// Schedule a reactor-thread wakeup. Coalescing, non-blocking.
    fn wake(&self) -> Result<()>;

    /// Block until at least one wake since the last `wait()` return.
    fn wait(&self);

    /// Implementation name, for logs.
    fn name(&self) -> &'static str;
}
