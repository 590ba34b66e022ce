//! evloop error types.
//!
//! Call-site failures (backend creation, double run, registration on a
//! closing loop) come back as `Err`. Failures detected on the reactor
//! thread after the fact (close with open handles, backend wake errors)
//! are pushed through the reactor's error `Signal` instead — no panic
//! ever crosses the reactor-thread boundary.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopError {
    /// Backend initialization failed (errno).
    BackendInit(i32),
    /// Backend wakeup write failed (errno).
    BackendWake(i32),
    /// `run()` called while another thread is already running the loop.
    AlreadyRunning,
    /// Operation refused because the loop (or handle) is closing/closed.
    Closing,
    /// `close()` called while handles are still registered.
    HandlesOpen(usize),
}

impl fmt::Display for LoopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendInit(e) => write!(f, "backend init failed: errno {}", e),
            Self::BackendWake(e) => write!(f, "backend wake failed: errno {}", e),
            Self::AlreadyRunning => write!(f, "loop already running on another thread"),
            Self::Closing => write!(f, "loop is closing"),
            Self::HandlesOpen(n) => write!(f, "close with {} handle(s) still open", n),
        }
    }
}

impl std::error::Error for LoopError {}

pub type Result<T> = std::result::Result<T, LoopError>;
