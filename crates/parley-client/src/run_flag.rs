//! Shared shutdown signal.
//!
//! One [`RunFlag`] is shared by both relays of a session (and by a bridge
//! when one is attached). It starts running; the first component that hits a
//! fatal or terminal condition stops it, and every other holder observes the
//! stop either by polling [`RunFlag::is_running`] at the top of its loop or by
//! awaiting [`RunFlag::stopped`] alongside its blocking read.
//!
//! # Invariants
//!
//! - Starts `true` (running).
//! - Only ever transitions `true -> false`, under the channel's lock; it is
//!   never set back to running.
//! - Exactly one [`RunFlag::stop`] call observes the transition.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable cooperative shutdown flag.
#[derive(Debug, Clone)]
pub struct RunFlag {
    state: Arc<watch::Sender<bool>>,
}

impl RunFlag {
    /// Create a flag in the running state.
    pub fn new() -> Self {
        let (state, _) = watch::channel(true);
        Self { state: Arc::new(state) }
    }

    /// Whether the session should keep going. Lock-free snapshot; may be
    /// stale by the time the caller acts on it.
    pub fn is_running(&self) -> bool {
        *self.state.borrow()
    }

    /// Request shutdown.
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// flag was already stopped.
    pub fn stop(&self) -> bool {
        self.state.send_if_modified(|running| std::mem::replace(running, false))
    }

    /// Resolve once the flag is stopped. Returns immediately if it already
    /// is.
    pub async fn stopped(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so the wait cannot fail.
        let _ = rx.wait_for(|running| !*running).await;
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}
