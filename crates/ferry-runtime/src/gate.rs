#![forbid(unsafe_code)]

//! One-shot latch used for thread sequencing.
//!
//! The runtime uses two of these: the start gate, opened by a zero-delay
//! deferred action on the UI loop so the interpreter entry point cannot
//! run before the loop is processing events, and the stop gate, which ends
//! the interpreter thread's cooperative drain loop during teardown.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Waiting side of a one-shot latch.
#[derive(Clone)]
pub struct Gate {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

/// Opening side of a one-shot latch.
pub struct GateTrigger {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Gate {
    /// Create a latch pair (waiter, opener).
    #[must_use]
    pub fn new() -> (Self, GateTrigger) {
        let inner = Arc::new((Mutex::new(false), Condvar::new()));
        let gate = Self {
            inner: inner.clone(),
        };
        let trigger = GateTrigger { inner };
        (gate, trigger)
    }

    /// Whether the latch has been opened.
    #[must_use]
    pub fn is_open(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap()
    }

    /// Block until the latch opens.
    pub fn wait(&self) {
        let (lock, cvar) = &*self.inner;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = cvar.wait(open).unwrap();
        }
    }

    /// Block until the latch opens or the timeout elapses.
    ///
    /// Returns `true` if open. Handles spurious wakeups by looping until
    /// the condition holds or the timeout expires.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut open = lock.lock().unwrap();
        if *open {
            return true;
        }

        let start = Instant::now();
        let mut remaining = duration;

        loop {
            let (guard, result) = cvar.wait_timeout(open, remaining).unwrap();
            open = guard;
            if *open {
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
}

impl GateTrigger {
    /// Open the latch, waking every waiter. Idempotent.
    pub fn open(&self) {
        let (lock, cvar) = &*self.inner;
        let mut open = lock.lock().unwrap();
        *open = true;
        cvar.notify_all();
    }
}
