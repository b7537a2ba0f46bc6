#![forbid(unsafe_code)]

//! Interpreter-side endpoint: entry point, context, and thread body.
//!
//! The endpoint runs on the dedicated interpreter thread. It blocks on the
//! start gate (opened by the UI loop's first iteration), posts the one-shot
//! ready notification, invokes the interpreter entry point, reports the
//! exit status exactly once, then drains the callback queue cooperatively
//! until the coordinator fires the stop gate. Remaining queued calls are
//! delivered before the thread exits; nothing is dropped.

use std::sync::Arc;
use std::time::Duration;

use ferry_core::{CallbackQueue, Fault, TargetRegistry};

use crate::event_loop::{LoopHandle, LoopMsg};
use crate::gate::Gate;
use crate::handshake::ShutdownRequester;

/// Poll interval for the post-finish cooperative drain loop.
const TAIL_POLL: Duration = Duration::from_millis(25);

/// Exit status reported when the entry point terminates abnormally.
const FAILURE_STATUS: i32 = 1;

/// The interpreter subsystem, as seen by the bridge.
///
/// `run` is invoked exactly once, on the interpreter thread, after the UI
/// event loop has begun processing events. Faults belong inside the entry
/// point; the return value is the process exit status.
pub trait Interpreter: Send {
    /// Execute interpreter code to completion and return the exit status.
    fn run(&mut self, ctx: &InterpreterContext) -> i32;
}

/// What the entry point can reach while running.
pub struct InterpreterContext {
    queue: Arc<CallbackQueue>,
    targets: Arc<TargetRegistry>,
    handle: LoopHandle,
    requester: ShutdownRequester,
    stop: Gate,
}

impl InterpreterContext {
    pub(crate) fn new(
        queue: Arc<CallbackQueue>,
        targets: Arc<TargetRegistry>,
        handle: LoopHandle,
        requester: ShutdownRequester,
        stop: Gate,
    ) -> Self {
        Self {
            queue,
            targets,
            handle,
            requester,
            stop,
        }
    }

    /// Execute queued deferred calls on the current thread.
    ///
    /// Interpreter code calls this at its own sync points. A fault
    /// surfaces here exactly as if it had been raised locally; calls
    /// queued behind the faulting one stay queued for the next pass.
    pub fn process_deferred(&self) -> Result<usize, Fault> {
        self.queue.drain_and_execute(&self.targets)
    }

    /// Block until a deferred call is queued or the timeout elapses.
    ///
    /// Returns `true` if work is available.
    pub fn wait_for_deferred(&self, timeout: Duration) -> bool {
        self.queue.wait_timeout(timeout)
    }

    /// Run the shutdown handshake against the UI thread.
    ///
    /// Blocks until the vote arrives. `false` means vetoed: keep running,
    /// nothing has changed.
    pub fn request_shutdown(&self) -> bool {
        self.requester.request()
    }

    /// Whether the UI event loop has begun processing events.
    #[must_use]
    pub fn ui_live(&self) -> bool {
        self.handle.loop_entered() > 0
    }

    /// Handle for posting work to the UI loop or submitting calls.
    #[must_use]
    pub fn loop_handle(&self) -> &LoopHandle {
        &self.handle
    }

    /// Registry of live receiver identities.
    #[must_use]
    pub fn targets(&self) -> &Arc<TargetRegistry> {
        &self.targets
    }

    /// Whether the coordinator has begun teardown.
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.stop.is_open()
    }
}

/// Reports the interpreter exit status exactly once.
///
/// Dropped unfinished (the entry point unwound), it reports a failure
/// status so the coordinator still tears down in order.
pub(crate) struct FinishGuard {
    handle: LoopHandle,
    reported: bool,
}

impl FinishGuard {
    pub(crate) fn new(handle: LoopHandle) -> Self {
        Self {
            handle,
            reported: false,
        }
    }

    pub(crate) fn finish(&mut self, code: i32) {
        if self.reported {
            return;
        }
        self.reported = true;
        if !self.handle.post(LoopMsg::Finished(code)) {
            tracing::warn!(code, "completion report found no event loop");
        }
    }
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        if !self.reported {
            tracing::error!("interpreter entry point did not report completion, assuming failure");
            self.finish(FAILURE_STATUS);
        }
    }
}

/// Owns the boxed interpreter and runs it on the dedicated thread.
pub(crate) struct InterpreterEndpoint {
    interp: Box<dyn Interpreter>,
    ctx: InterpreterContext,
}

impl InterpreterEndpoint {
    pub(crate) fn new(interp: Box<dyn Interpreter>, ctx: InterpreterContext) -> Self {
        Self { interp, ctx }
    }

    /// Thread body for the interpreter thread.
    pub(crate) fn execute(mut self, start: Gate) {
        start.wait();
        tracing::debug!("start gate open, entering interpreter");
        self.ctx.handle.post(LoopMsg::Ready);

        let mut guard = FinishGuard::new(self.ctx.handle.clone());
        let code = self.interp.run(&self.ctx);
        guard.finish(code);

        // Cooperative drain until the coordinator fires the stop gate,
        // plus one final pass for calls that raced the gate.
        loop {
            self.drain_remaining();
            if self.ctx.stop.is_open() {
                self.drain_remaining();
                break;
            }
            self.ctx.queue.wait_timeout(TAIL_POLL);
        }
        tracing::debug!(code, "interpreter thread exiting");
    }

    fn drain_remaining(&self) {
        loop {
            match self.ctx.queue.drain_and_execute(&self.ctx.targets) {
                Ok(_) => break,
                Err(fault) => {
                    tracing::error!(%fault, "unhandled fault after interpreter finish");
                }
            }
        }
    }
}
