//! Handle driver seam and walk references.
//!
//! Every resource attached to a reactor registers an `Arc<dyn
//! HandleDriver>` with the loop's registry. The registry entry keeps the
//! driver alive while the handle is active (an explicit arena instead of
//! self-referential keep-alive counting), and the reactor thread talks to
//! the handle exclusively through this trait.

use crate::reactor::LoopShared;
use evloop_core::id::HandleId;
use evloop_core::state::HandleState;
use std::sync::Arc;

/// Reactor-thread view of a registered handle.
///
/// **Contract:**
/// - `drain()` and `teardown()` are only invoked on the loop thread.
/// - `drain()` delivers whatever the handle's producers signaled; it is
///   never called once the registry entry has left `Active`.
/// - `teardown()` is called exactly once, after the entry has been
///   removed from the registry; it must release pending work and fire
///   the handle's closed notification.
pub trait HandleDriver: Send + Sync {
    fn drain(&self);
    fn teardown(&self);
}

/// Borrowed view of one registered handle, yielded by `Reactor::walk`.
pub struct HandleRef<'a> {
    pub(crate) shared: &'a Arc<LoopShared>,
    pub(crate) id: HandleId,
    pub(crate) state: HandleState,
}

impl HandleRef<'_> {
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// State snapshot taken when the walk started.
    pub fn state(&self) -> HandleState {
        self.state
    }

    /// Request teardown, bypassing any graceful per-handle shutdown.
    /// Idempotent; a handle already Closing/Closed is left alone.
    pub fn force_close(&self) {
        self.shared.request_close(self.id);
    }
}
