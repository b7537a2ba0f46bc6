#![forbid(unsafe_code)]

//! Ferry Runtime
//!
//! This crate hosts a long-running interpreter on a dedicated thread
//! beside a UI event loop, and owns everything that crosses the boundary
//! between them: deferred-call delivery, fault relaying, startup
//! sequencing, and the shutdown handshake.
//!
//! # Key Components
//!
//! - [`Shell`] - Lifecycle coordinator; `start()` blocks in the event loop
//! - [`Interpreter`] - Trait the embedded interpreter implements
//! - [`InterpreterContext`] - What the entry point can reach while running
//! - [`LoopHandle`] - Any-thread handle for posting UI work and
//!   submitting deferred calls
//! - [`FaultRelay`] - Captures UI-thread faults for re-raise on the
//!   interpreter thread
//! - [`UiSurface`] - Optional UI collaborator (ready hook, quit
//!   confirmation)
//!
//! # How it fits together
//!
//! The thread calling [`Shell::start`] becomes the UI thread. The shell
//! arms the interpreter with a zero-delay deferred action, spawns the
//! interpreter thread, and pumps the loop until the interpreter reports
//! completion; the reported status becomes the return value of `start()`.
//! All cross-thread faults travel through the callback queue in
//! `ferry-core`; nothing ever unwinds across the boundary.

pub mod diagnostics;
pub mod event_loop;
pub mod gate;
mod handshake;
pub mod interp;
pub mod locale;
pub mod relay;
pub mod scripted;
pub mod shell;
pub mod surface;

pub use event_loop::{DeferredAction, LoopHandle, UiDispatch};
pub use ferry_core::{
    CallBody, CallId, CallbackQueue, DeferredCall, Fault, FaultKind, TargetGuard, TargetId,
    TargetRegistry,
};
pub use gate::{Gate, GateTrigger};
pub use interp::{Interpreter, InterpreterContext};
pub use locale::{Locale, TranslatorSet, detect_system_locale};
pub use relay::FaultRelay;
pub use scripted::ScriptedInterpreter;
pub use shell::{LifecycleState, Shell, ShellConfig};
pub use surface::UiSurface;
