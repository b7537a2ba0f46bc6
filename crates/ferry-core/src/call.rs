#![forbid(unsafe_code)]

//! Deferred calls: immutable units of work executed on the interpreter
//! thread.
//!
//! A call is either free-standing or bound to a receiver identity. Bound
//! calls are validated against the [`TargetRegistry`] at execution time;
//! a stale target makes the call a silent no-op rather than an error,
//! because the receiver may legitimately have been destroyed after the
//! call was queued.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::fault::Fault;
use crate::target::{TargetId, TargetRegistry};

static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(1);

/// Boxed call body. Bodies that cannot fail are wrapped to return `Ok(())`.
pub type CallBody = Box<dyn FnOnce() -> Result<(), Fault> + Send>;

/// Process-unique identity of a deferred call.
///
/// Stable across the call's lifetime; usable by submitters for routing,
/// deduplication, and equality checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallId(u64);

impl CallId {
    fn next() -> Self {
        CallId(NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

enum CallKind {
    Free(CallBody),
    Bound { target: TargetId, body: CallBody },
}

/// An immutable unit of work queued for the interpreter thread.
///
/// Constructed on any thread, consumed exactly once on the interpreter
/// thread, discarded after execution. The body captures its state by value;
/// nothing is shared by reference across the thread boundary.
pub struct DeferredCall {
    id: CallId,
    kind: CallKind,
}

impl DeferredCall {
    /// A free-standing call that cannot fail.
    pub fn free(f: impl FnOnce() + Send + 'static) -> Self {
        Self::try_free(move || {
            f();
            Ok(())
        })
    }

    /// A free-standing call whose body may raise a fault.
    pub fn try_free(f: impl FnOnce() -> Result<(), Fault> + Send + 'static) -> Self {
        Self {
            id: CallId::next(),
            kind: CallKind::Free(Box::new(f)),
        }
    }

    /// A call bound to a receiver identity; skipped if the receiver is gone.
    pub fn bound(target: TargetId, f: impl FnOnce() + Send + 'static) -> Self {
        Self::try_bound(target, move || {
            f();
            Ok(())
        })
    }

    /// A bound call whose body may raise a fault.
    pub fn try_bound(
        target: TargetId,
        f: impl FnOnce() -> Result<(), Fault> + Send + 'static,
    ) -> Self {
        Self {
            id: CallId::next(),
            kind: CallKind::Bound {
                target,
                body: Box::new(f),
            },
        }
    }

    /// A call that re-raises the given fault when executed.
    ///
    /// This is how a fault captured on another thread surfaces on the
    /// interpreter thread: the value travels through the queue like any
    /// other call and becomes an `Err` at execution time.
    #[must_use]
    pub fn raise(fault: Fault) -> Self {
        Self::try_free(move || Err(fault))
    }

    /// The call's process-unique identity.
    #[must_use]
    pub fn id(&self) -> CallId {
        self.id
    }

    /// The receiver identity, for bound calls.
    #[must_use]
    pub fn target(&self) -> Option<TargetId> {
        match &self.kind {
            CallKind::Free(_) => None,
            CallKind::Bound { target, .. } => Some(*target),
        }
    }

    /// Execute the call on the current thread.
    ///
    /// Must only be invoked by the interpreter thread. A bound call whose
    /// target is no longer live returns `Ok(())` without running its body.
    pub fn execute(self, targets: &TargetRegistry) -> Result<(), Fault> {
        match self.kind {
            CallKind::Free(body) => body(),
            CallKind::Bound { target, body } => {
                if targets.is_live(target) {
                    body()
                } else {
                    tracing::trace!(call = self.id.0, target = ?target, "stale target, skipping");
                    Ok(())
                }
            }
        }
    }
}

impl fmt::Debug for DeferredCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CallKind::Free(_) => f.debug_struct("DeferredCall").field("id", &self.id).finish(),
            CallKind::Bound { target, .. } => f
                .debug_struct("DeferredCall")
                .field("id", &self.id)
                .field("target", target)
                .finish(),
        }
    }
}
