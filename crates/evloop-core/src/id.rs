//! Identifier newtypes and thread identity.
//!
//! `HandleId` indexes the reactor's handle registry; `RequestId` is the
//! monotonically increasing correlation id handed out per in-flight call.
//! `current_tid()` gives every OS thread a small stable u64 so the reactor
//! can record its owning thread in an atomic (0 is reserved for "no
//! owner").

use std::sync::atomic::{AtomicU64, Ordering};

/// Registry index of a handle attached to a reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl HandleId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Correlation id of one in-flight request. Used by at most one call at
/// a time; never reused within a correlator's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl RequestId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

static NEXT_TID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static TID: u64 = NEXT_TID.fetch_add(1, Ordering::Relaxed);
}

/// Stable per-thread identity, never 0.
#[inline]
pub fn current_tid() -> u64 {
    TID.with(|t| *t)
}
