#![forbid(unsafe_code)]

//! Collaborator interface for an optional UI surface.

/// A UI surface attached to the event loop (absent in headless mode).
///
/// Implementations own the toolkit-specific window/menu/dialog machinery,
/// which is outside the bridge. Both methods are invoked on the UI thread.
pub trait UiSurface: Send {
    /// Invoked once after interpreter startup completes, so the surface
    /// can unlock interactive features.
    fn ready(&mut self) {}

    /// Synchronous shutdown confirmation. May block on user input.
    ///
    /// Returning `false` vetoes the shutdown; the interpreter keeps
    /// running as if the request never happened.
    fn confirm_quit(&mut self) -> bool {
        true
    }
}
