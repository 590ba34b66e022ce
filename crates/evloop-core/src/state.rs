//! Handle lifecycle states and loop run modes.

/// Lifecycle of a handle attached to a reactor.
///
/// Transitions are one-way: `Active → Closing → Closed`. Once a handle
/// leaves `Active`, no further callbacks fire for it and operations on
/// it (raise/call) are silently skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Active,
    Closing,
    Closed,
}

impl HandleState {
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, HandleState::Active)
    }
}

/// How `Reactor::run()` iterates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Run until stopped or no active handles remain.
    UntilDone,
    /// One iteration; block waiting for a wakeup if nothing is pending.
    Once,
    /// One iteration; never block.
    NoWait,
}
