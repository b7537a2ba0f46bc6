#![forbid(unsafe_code)]

//! Fault relay: capture on the UI thread, re-raise on the interpreter
//! thread.
//!
//! A fault observed while UI-thread code re-enters interpreter-owned logic
//! must never be handled in place and must never unwind across the thread
//! boundary. The relay wraps the captured value in a re-raising deferred
//! call and submits it through the callback queue; the fault then surfaces
//! on the interpreter thread with kind, identifier, and message intact.

use std::sync::Arc;

use ferry_core::{CallbackQueue, DeferredCall, Fault};

/// UI-thread-side endpoint of the fault hop.
#[derive(Clone)]
pub struct FaultRelay {
    queue: Arc<CallbackQueue>,
}

impl FaultRelay {
    /// Create a relay submitting into the given queue.
    #[must_use]
    pub fn new(queue: Arc<CallbackQueue>) -> Self {
        Self { queue }
    }

    /// Capture a fault and queue its re-raise on the interpreter thread.
    ///
    /// Never surfaces the fault locally. Submission is infallible; a
    /// failure of the dispatch mechanism itself is a fatal condition
    /// handled by the process abort policy, not here.
    pub fn relay(&self, fault: Fault) {
        tracing::debug!(kind = fault.kind().as_str(), message = fault.message(), "relaying fault");
        self.queue.submit(DeferredCall::raise(fault));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_core::{FaultKind, TargetRegistry};

    #[test]
    fn relayed_fault_reappears_unchanged_on_drain() {
        let queue = Arc::new(CallbackQueue::new());
        let targets = TargetRegistry::new();
        let relay = FaultRelay::new(queue.clone());

        let fault = Fault::new(FaultKind::Arity, "expected 2 args")
            .with_identifier("ferry:bad-arity");
        relay.relay(fault.clone());

        assert_eq!(queue.drain_and_execute(&targets).unwrap_err(), fault);
    }

    #[test]
    fn relay_does_not_execute_locally() {
        let queue = Arc::new(CallbackQueue::new());
        let relay = FaultRelay::new(queue.clone());

        relay.relay(Fault::new(FaultKind::User, "deferred"));
        // The fault sits in the queue until the interpreter thread drains.
        assert_eq!(queue.len(), 1);
    }
}
