#![forbid(unsafe_code)]

//! The UI thread's event loop and its posting handle.
//!
//! The loop is a message pump: collaborators post work through a
//! [`LoopHandle`] and the owning thread processes it in arrival order.
//! Everything the bridge guarantees about startup ordering hangs off one
//! fact: a deferred action posted before the loop runs is processed as the
//! loop's first message, so anything it unblocks observes a live loop.
//!
//! The loop exits only when the interpreter reports completion; the exit
//! status it carries becomes the loop's return value.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;

use ferry_core::{CallbackQueue, DeferredCall, Fault};

use crate::gate::GateTrigger;
use crate::handshake;
use crate::relay::FaultRelay;
use crate::surface::UiSurface;

/// Closure dispatched against the UI surface on the UI thread.
pub type UiDispatch = Box<dyn FnOnce(&mut dyn UiSurface) -> Result<(), Fault> + Send>;

/// Zero-delay deferred action: runs on the loop's next iteration.
pub type DeferredAction = Box<dyn FnOnce() + Send>;

pub(crate) enum LoopMsg {
    /// Run an action on the next loop iteration.
    Deferred(DeferredAction),
    /// Dispatch a toolkit callback against the UI surface.
    Dispatch(UiDispatch),
    /// Interpreter startup has completed; unlock the surface.
    Ready,
    /// Interpreter execution ended with the given status.
    Finished(i32),
    /// Synchronous shutdown confirmation request.
    ConfirmQuit { reply: mpsc::Sender<bool> },
}

/// Clonable, `Send` handle for posting work to the UI event loop.
///
/// Also the any-thread entry point for submitting deferred calls to the
/// interpreter: submission goes straight into the thread-safe callback
/// queue, not through the loop.
#[derive(Clone)]
pub struct LoopHandle {
    tx: mpsc::Sender<LoopMsg>,
    queue: Arc<CallbackQueue>,
    entered: Arc<AtomicU64>,
}

impl LoopHandle {
    /// Post an action to run on the loop's next iteration.
    ///
    /// Returns `false` if the loop is gone.
    pub fn defer(&self, f: impl FnOnce() + Send + 'static) -> bool {
        self.post(LoopMsg::Deferred(Box::new(f)))
    }

    /// Dispatch a fallible toolkit callback against the UI surface.
    ///
    /// A fault returned by the callback is captured and relayed to the
    /// interpreter thread; it never surfaces on the UI thread. Returns
    /// `false` if the loop is gone.
    pub fn dispatch(
        &self,
        f: impl FnOnce(&mut dyn UiSurface) -> Result<(), Fault> + Send + 'static,
    ) -> bool {
        self.post(LoopMsg::Dispatch(Box::new(f)))
    }

    /// Submit a deferred call for execution on the interpreter thread.
    pub fn submit(&self, call: DeferredCall) {
        self.queue.submit(call);
    }

    /// How many times the loop has been entered (0 before start, 1 after).
    #[must_use]
    pub fn loop_entered(&self) -> u64 {
        self.entered.load(Ordering::SeqCst)
    }

    pub(crate) fn post(&self, msg: LoopMsg) -> bool {
        self.tx.send(msg).is_ok()
    }

    pub(crate) fn sender(&self) -> mpsc::Sender<LoopMsg> {
        self.tx.clone()
    }
}

/// The event loop owned by the UI thread.
pub(crate) struct EventLoop {
    rx: mpsc::Receiver<LoopMsg>,
    handle: LoopHandle,
}

impl EventLoop {
    pub(crate) fn new(queue: Arc<CallbackQueue>) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = LoopHandle {
            tx,
            queue,
            entered: Arc::new(AtomicU64::new(0)),
        };
        Self { rx, handle }
    }

    pub(crate) fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Process messages until the interpreter reports completion.
    ///
    /// Returns the exit status carried by the completion notification.
    pub(crate) fn run(
        self,
        ui: &mut Option<Box<dyn UiSurface>>,
        relay: &FaultRelay,
        stop: &GateTrigger,
    ) -> i32 {
        self.handle.entered.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(target: "ferry_ui", "event loop entered");

        loop {
            let msg = match self.rx.recv() {
                Ok(msg) => msg,
                Err(_) => {
                    tracing::warn!("event loop channel disconnected before completion");
                    stop.open();
                    return 1;
                }
            };

            match msg {
                LoopMsg::Deferred(f) => f(),
                LoopMsg::Dispatch(f) => match ui.as_deref_mut() {
                    Some(surface) => {
                        if let Err(fault) = f(surface) {
                            relay.relay(fault);
                        }
                    }
                    None => {
                        tracing::warn!("ui dispatch with no surface attached, skipped");
                    }
                },
                LoopMsg::Ready => {
                    tracing::debug!(target: "ferry_ui", "interpreter ready");
                    if let Some(surface) = ui.as_deref_mut() {
                        surface.ready();
                    }
                }
                LoopMsg::ConfirmQuit { reply } => {
                    let vote = handshake::confirm(ui.as_deref_mut());
                    tracing::debug!(vote, "shutdown confirmation answered");
                    if reply.send(vote).is_err() {
                        tracing::warn!("shutdown requester went away before the vote arrived");
                    }
                }
                LoopMsg::Finished(code) => {
                    tracing::debug!(code, "interpreter finished, stopping event loop");
                    stop.open();
                    return code;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Gate;
    use ferry_core::FaultKind;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    struct NullSurface {
        ready_calls: Arc<AtomicU64>,
    }

    impl UiSurface for NullSurface {
        fn ready(&mut self) {
            self.ready_calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn spawn_loop(
        queue: Arc<CallbackQueue>,
        mut ui: Option<Box<dyn UiSurface>>,
    ) -> (LoopHandle, thread::JoinHandle<i32>) {
        let event_loop = EventLoop::new(queue.clone());
        let handle = event_loop.handle();
        let join = thread::spawn(move || {
            let relay = FaultRelay::new(queue);
            let (_gate, stop) = Gate::new();
            event_loop.run(&mut ui, &relay, &stop)
        });
        (handle, join)
    }

    #[test]
    fn finished_code_becomes_return_value() {
        let queue = Arc::new(CallbackQueue::new());
        let (handle, join) = spawn_loop(queue, None);
        assert!(handle.post(LoopMsg::Finished(42)));
        assert_eq!(join.join().unwrap(), 42);
    }

    #[test]
    fn deferred_actions_run_in_post_order() {
        let queue = Arc::new(CallbackQueue::new());
        let (handle, join) = spawn_loop(queue, None);
        let log = Arc::new(Mutex::new(Vec::new()));

        for value in 0..5 {
            let log = log.clone();
            handle.defer(move || log.lock().unwrap().push(value));
        }
        handle.post(LoopMsg::Finished(0));
        join.join().unwrap();

        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn dispatch_fault_is_relayed_not_raised_locally() {
        let queue = Arc::new(CallbackQueue::new());
        let ready_calls = Arc::new(AtomicU64::new(0));
        let surface = NullSurface {
            ready_calls: ready_calls.clone(),
        };
        let (handle, join) = spawn_loop(queue.clone(), Some(Box::new(surface)));

        handle.dispatch(|_ui| Err(Fault::new(FaultKind::Index, "out of range")));
        handle.post(LoopMsg::Finished(0));
        assert_eq!(join.join().unwrap(), 0);

        // The fault went into the queue for the interpreter thread.
        let targets = ferry_core::TargetRegistry::new();
        let fault = queue.drain_and_execute(&targets).unwrap_err();
        assert_eq!(fault.kind(), FaultKind::Index);
        assert_eq!(fault.message(), "out of range");
    }

    #[test]
    fn dispatch_without_surface_is_skipped() {
        let queue = Arc::new(CallbackQueue::new());
        let (handle, join) = spawn_loop(queue.clone(), None);

        handle.dispatch(|_ui| Err(Fault::new(FaultKind::User, "unreachable")));
        handle.post(LoopMsg::Finished(0));
        join.join().unwrap();

        // Nothing dispatched, nothing relayed.
        assert!(queue.is_empty());
    }

    #[test]
    fn ready_reaches_the_surface_once() {
        let queue = Arc::new(CallbackQueue::new());
        let ready_calls = Arc::new(AtomicU64::new(0));
        let surface = NullSurface {
            ready_calls: ready_calls.clone(),
        };
        let (handle, join) = spawn_loop(queue, Some(Box::new(surface)));

        handle.post(LoopMsg::Ready);
        handle.post(LoopMsg::Finished(0));
        join.join().unwrap();

        assert_eq!(ready_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn confirm_quit_defaults_to_proceed_without_surface() {
        let queue = Arc::new(CallbackQueue::new());
        let (handle, join) = spawn_loop(queue, None);

        let (reply_tx, reply_rx) = mpsc::channel();
        handle.post(LoopMsg::ConfirmQuit { reply: reply_tx });
        assert!(reply_rx.recv_timeout(Duration::from_secs(5)).unwrap());

        handle.post(LoopMsg::Finished(0));
        join.join().unwrap();
    }

    #[test]
    fn entry_counter_increments_once() {
        let queue = Arc::new(CallbackQueue::new());
        let (handle, join) = spawn_loop(queue, None);
        assert!(handle.defer(|| {}));
        handle.post(LoopMsg::Finished(0));
        join.join().unwrap();
        assert_eq!(handle.loop_entered(), 1);
    }
}
