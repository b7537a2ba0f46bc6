#![forbid(unsafe_code)]

//! Two-phase shutdown confirmation.
//!
//! The interpreter thread asks, the UI thread answers. Headless
//! composition (no surface) always votes to proceed; interactive
//! composition delegates to the surface's confirmation routine, which may
//! block on user input. A `false` vote aborts the shutdown and leaves the
//! interpreter's run state untouched.

use std::sync::mpsc;

use crate::event_loop::LoopMsg;
use crate::surface::UiSurface;

/// Compute the shutdown vote on the UI thread.
pub(crate) fn confirm(ui: Option<&mut (dyn UiSurface + 'static)>) -> bool {
    match ui {
        None => true,
        Some(surface) => surface.confirm_quit(),
    }
}

/// Interpreter-side end of the handshake.
///
/// Blocks the calling (interpreter) thread until the UI thread answers.
/// This is the one intentional cross-thread blocking exchange in the
/// system.
pub(crate) struct ShutdownRequester {
    tx: mpsc::Sender<LoopMsg>,
}

impl ShutdownRequester {
    pub(crate) fn new(tx: mpsc::Sender<LoopMsg>) -> Self {
        Self { tx }
    }

    /// Request confirmation and wait for the vote.
    ///
    /// A broken exchange (event loop gone, reply channel dropped) counts
    /// as a veto: shutdown must never proceed on a half-torn-down system.
    pub(crate) fn request(&self) -> bool {
        let (reply_tx, reply_rx) = mpsc::channel();
        if self.tx.send(LoopMsg::ConfirmQuit { reply: reply_tx }).is_err() {
            tracing::warn!("shutdown requested with no event loop, vetoing");
            return false;
        }
        match reply_rx.recv() {
            Ok(vote) => vote,
            Err(_) => {
                tracing::warn!("shutdown confirmation went unanswered, vetoing");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VetoSurface;

    impl UiSurface for VetoSurface {
        fn confirm_quit(&mut self) -> bool {
            false
        }
    }

    #[test]
    fn headless_vote_is_proceed() {
        assert!(confirm(None));
    }

    #[test]
    fn surface_vote_is_authoritative() {
        let mut surface = VetoSurface;
        assert!(!confirm(Some(&mut surface)));
    }

    #[test]
    fn dead_loop_counts_as_veto() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let requester = ShutdownRequester::new(tx);
        assert!(!requester.request());
    }

    #[test]
    fn dropped_reply_counts_as_veto() {
        let (tx, rx) = mpsc::channel();
        let requester = ShutdownRequester::new(tx);

        let answerer = std::thread::spawn(move || {
            // Receive the request but drop the reply channel unanswered.
            let msg = rx.recv().unwrap();
            drop(msg);
        });

        assert!(!requester.request());
        answerer.join().unwrap();
    }
}
