#![forbid(unsafe_code)]

//! Thread-safe FIFO inbox for deferred calls.
//!
//! Producers on any thread submit; the interpreter thread is the sole
//! consumer. Submission is infallible and never blocks the consumer.
//! Delivery is exactly-once and in submission order; a fault raised by one
//! call leaves every later call queued for the next drain, so nothing is
//! ever dropped.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::call::DeferredCall;
use crate::fault::Fault;
use crate::target::TargetRegistry;

/// Order-preserving inbox owned by the interpreter-side endpoint.
#[derive(Debug, Default)]
pub struct CallbackQueue {
    calls: Mutex<VecDeque<DeferredCall>>,
    ready: Condvar,
}

impl CallbackQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a call for execution on the interpreter thread.
    ///
    /// Callable from any thread; never fails and never blocks the
    /// consumer. Calls submitted by one thread are delivered in submission
    /// order.
    pub fn submit(&self, call: DeferredCall) {
        let mut calls = self.calls.lock().unwrap();
        tracing::trace!(call = ?call.id(), queued = calls.len(), "call submitted");
        calls.push_back(call);
        self.ready.notify_all();
    }

    /// Take the oldest queued call, if any.
    pub fn pop(&self) -> Option<DeferredCall> {
        self.calls.lock().unwrap().pop_front()
    }

    /// Number of queued calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Whether the queue is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.lock().unwrap().is_empty()
    }

    /// Block until a call is queued or the timeout elapses.
    ///
    /// Returns `true` if work is available. Handles spurious wakeups by
    /// looping until the condition holds or the timeout expires.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let mut calls = self.calls.lock().unwrap();
        if !calls.is_empty() {
            return true;
        }

        let start = Instant::now();
        let mut remaining = duration;

        loop {
            let (guard, result) = self.ready.wait_timeout(calls, remaining).unwrap();
            calls = guard;
            if !calls.is_empty() {
                return true;
            }
            if result.timed_out() {
                return false;
            }
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return false;
            }
            remaining = duration - elapsed;
        }
    }

    /// Execute queued calls on the calling thread, in submission order.
    ///
    /// Must only be invoked by the interpreter thread. Calls are taken one
    /// at a time and executed outside the lock, so a call submitted
    /// mid-drain runs in this pass; a call submitted after the last pop
    /// runs in the next. On a fault the remaining calls stay queued and the
    /// fault is returned to the caller, the interpreter-thread equivalent
    /// of a raise. Returns the number of calls executed on success.
    pub fn drain_and_execute(&self, targets: &TargetRegistry) -> Result<usize, Fault> {
        let mut executed = 0;
        while let Some(call) = self.pop() {
            call.execute(targets)?;
            executed += 1;
        }
        if executed > 0 {
            tracing::trace!(executed, "drained deferred calls");
        }
        Ok(executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{Fault, FaultKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;

    fn recording_call(log: &Arc<Mutex<Vec<u32>>>, value: u32) -> DeferredCall {
        let log = log.clone();
        DeferredCall::free(move || log.lock().unwrap().push(value))
    }

    #[test]
    fn delivers_in_submission_order() {
        let queue = CallbackQueue::new();
        let targets = TargetRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for value in 0..16 {
            queue.submit(recording_call(&log, value));
        }
        assert_eq!(queue.drain_and_execute(&targets).unwrap(), 16);
        assert_eq!(*log.lock().unwrap(), (0..16).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn fault_leaves_later_calls_queued() {
        let queue = CallbackQueue::new();
        let targets = TargetRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        queue.submit(recording_call(&log, 1));
        queue.submit(DeferredCall::raise(Fault::new(FaultKind::User, "boom")));
        queue.submit(recording_call(&log, 2));

        let fault = queue.drain_and_execute(&targets).unwrap_err();
        assert_eq!(fault.kind(), FaultKind::User);
        assert_eq!(*log.lock().unwrap(), vec![1]);
        assert_eq!(queue.len(), 1);

        // The next drain delivers the remainder.
        assert_eq!(queue.drain_and_execute(&targets).unwrap(), 1);
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn multi_producer_delivery_is_exactly_once() {
        let queue = Arc::new(CallbackQueue::new());
        let targets = TargetRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 50;

        let handles: Vec<_> = (0..PRODUCERS)
            .map(|_| {
                let queue = queue.clone();
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..PER_PRODUCER {
                        let counter = counter.clone();
                        queue.submit(DeferredCall::free(move || {
                            counter.fetch_add(1, Ordering::SeqCst);
                        }));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut total = 0;
        while total < PRODUCERS * PER_PRODUCER {
            total += queue.drain_and_execute(&targets).unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), PRODUCERS * PER_PRODUCER);
        assert!(queue.is_empty());
    }

    #[test]
    fn per_producer_order_survives_interleaving() {
        let queue = Arc::new(CallbackQueue::new());
        let targets = TargetRegistry::new();
        let log: Arc<Mutex<Vec<(usize, u32)>>> = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..4)
            .map(|producer| {
                let queue = queue.clone();
                let log = log.clone();
                thread::spawn(move || {
                    for seq in 0..25u32 {
                        let log = log.clone();
                        queue.submit(DeferredCall::free(move || {
                            log.lock().unwrap().push((producer, seq));
                        }));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        while queue.drain_and_execute(&targets).unwrap() > 0 {}

        let log = log.lock().unwrap();
        for producer in 0..4 {
            let seqs: Vec<u32> = log
                .iter()
                .filter(|(p, _)| *p == producer)
                .map(|(_, s)| *s)
                .collect();
            assert_eq!(seqs, (0..25).collect::<Vec<_>>());
        }
    }

    #[test]
    fn wait_timeout_returns_false_when_idle() {
        let queue = CallbackQueue::new();
        assert!(!queue.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn wait_timeout_wakes_on_submission() {
        let queue = Arc::new(CallbackQueue::new());
        let waiter = queue.clone();
        let handle = thread::spawn(move || waiter.wait_timeout(Duration::from_secs(5)));

        thread::sleep(Duration::from_millis(20));
        queue.submit(DeferredCall::free(|| {}));
        assert!(handle.join().unwrap());
    }

    #[test]
    fn wait_timeout_returns_immediately_with_queued_work() {
        let queue = CallbackQueue::new();
        queue.submit(DeferredCall::free(|| {}));
        let start = Instant::now();
        assert!(queue.wait_timeout(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
