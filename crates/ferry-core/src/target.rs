#![forbid(unsafe_code)]

//! Identity registry for interpreter-owned receiver objects.
//!
//! A bound deferred call names its receiver by [`TargetId`] rather than by
//! reference, because the receiver may be destroyed between submission and
//! execution. The registry records which identities are still live;
//! registration returns an RAII [`TargetGuard`] so a receiver deregisters
//! exactly once, when it is dropped.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of an interpreter-owned object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(u64);

/// Shared set of live target identities.
///
/// Producers on any thread may check liveness, but the authoritative check
/// happens on the interpreter thread at execution time.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    live: Mutex<HashSet<TargetId>>,
}

impl TargetRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new target and return its RAII guard.
    ///
    /// The identity stays live until the guard is dropped.
    #[must_use = "dropping this guard deregisters the target"]
    pub fn register(self: &Arc<Self>) -> TargetGuard {
        let id = TargetId(NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed));
        self.live.lock().unwrap().insert(id);
        TargetGuard {
            registry: Arc::clone(self),
            id,
        }
    }

    /// Whether the given identity is still live.
    #[must_use]
    pub fn is_live(&self, id: TargetId) -> bool {
        self.live.lock().unwrap().contains(&id)
    }

    /// Number of currently live targets.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    fn deregister(&self, id: TargetId) {
        self.live.lock().unwrap().remove(&id);
    }
}

/// RAII registration of one target identity.
#[derive(Debug)]
pub struct TargetGuard {
    registry: Arc<TargetRegistry>,
    id: TargetId,
}

impl TargetGuard {
    /// The identity this guard keeps live.
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }
}

impl Drop for TargetGuard {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}
