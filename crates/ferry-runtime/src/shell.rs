#![forbid(unsafe_code)]

//! The shell: lifecycle coordinator for the interpreter/UI bridge.
//!
//! The shell owns both threads of interest. The thread that calls
//! [`Shell::start`] becomes the UI thread and blocks in the event loop;
//! the interpreter runs on a dedicated thread the shell spawns. Startup is
//! sequenced so the interpreter entry point cannot run before the loop is
//! processing events: the start gate opens from a zero-delay deferred
//! action, which by construction is handled after loop entry. Teardown is
//! sequenced the other way: the loop exits only on the interpreter's
//! completion report, fires the stop gate, and the shell then waits for
//! the thread's own termination before returning the exit status.
//!
//! # Composition
//!
//! - [`Shell::headless`] - no UI surface; shutdown requests always proceed.
//! - [`Shell::interactive`] - a [`UiSurface`] answers shutdown
//!   confirmations and receives the one-shot ready notification.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ferry_core::{CallbackQueue, TargetRegistry};

use crate::diagnostics;
use crate::event_loop::{EventLoop, LoopHandle};
use crate::gate::{Gate, GateTrigger};
use crate::handshake::{self, ShutdownRequester};
use crate::interp::{Interpreter, InterpreterContext, InterpreterEndpoint};
use crate::locale::{Locale, TranslatorSet};
use crate::relay::FaultRelay;
use crate::surface::UiSurface;

/// Where the shell is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Objects exist; no thread running.
    Constructed,
    /// Locale resources installed; still single-threaded.
    TranslatorsConfigured,
    /// The deferred start action is posted; the gate is not yet open.
    InterpreterArmed,
    /// Interpreter thread started; event loop processing.
    Running,
    /// Completion reported; tearing down.
    FinishRequested,
    /// Both threads done; exit status available.
    Stopped,
}

/// Shell configuration.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Application name, used for log context and the interpreter thread
    /// name.
    pub app_name: String,
    /// Application version string, logged at startup.
    pub app_version: String,
    /// Locale override; `None` detects the system locale.
    pub locale: Option<Locale>,
    /// Install the global diagnostics subscriber at construction.
    pub install_diagnostics: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            app_name: "ferry".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            locale: None,
            install_diagnostics: true,
        }
    }
}

impl ShellConfig {
    /// Set the application name.
    #[must_use]
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Set the application version string.
    #[must_use]
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    /// Force a locale instead of detecting the system one.
    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Skip installing the global diagnostics subscriber.
    #[must_use]
    pub fn without_diagnostics(mut self) -> Self {
        self.install_diagnostics = false;
        self
    }
}

/// Owns the event loop, the interpreter endpoint, and both thread handles.
pub struct Shell {
    config: ShellConfig,
    state: LifecycleState,
    queue: Arc<CallbackQueue>,
    targets: Arc<TargetRegistry>,
    relay: FaultRelay,
    event_loop: Option<EventLoop>,
    handle: LoopHandle,
    endpoint: Option<InterpreterEndpoint>,
    stop: Option<GateTrigger>,
    interp_thread: Option<JoinHandle<()>>,
    ui: Option<Box<dyn UiSurface>>,
    translators: TranslatorSet,
    exit_status: Option<i32>,
}

impl Shell {
    /// Shell with no UI surface. Shutdown requests always proceed.
    #[must_use]
    pub fn headless(interp: Box<dyn Interpreter>) -> Self {
        Self::with_config(interp, None, ShellConfig::default())
    }

    /// Shell with a UI surface answering shutdown confirmations.
    #[must_use]
    pub fn interactive(interp: Box<dyn Interpreter>, ui: Box<dyn UiSurface>) -> Self {
        Self::with_config(interp, Some(ui), ShellConfig::default())
    }

    /// Fully configured shell.
    #[must_use]
    pub fn with_config(
        interp: Box<dyn Interpreter>,
        ui: Option<Box<dyn UiSurface>>,
        config: ShellConfig,
    ) -> Self {
        if config.install_diagnostics {
            diagnostics::install();
        }

        let queue = Arc::new(CallbackQueue::new());
        let targets = Arc::new(TargetRegistry::new());
        let relay = FaultRelay::new(queue.clone());
        let event_loop = EventLoop::new(queue.clone());
        let handle = event_loop.handle();

        let (stop_gate, stop_trigger) = Gate::new();
        let ctx = InterpreterContext::new(
            queue.clone(),
            targets.clone(),
            handle.clone(),
            ShutdownRequester::new(handle.sender()),
            stop_gate,
        );
        let endpoint = InterpreterEndpoint::new(interp, ctx);

        Self {
            config,
            state: LifecycleState::Constructed,
            queue,
            targets,
            relay,
            event_loop: Some(event_loop),
            handle,
            endpoint: Some(endpoint),
            stop: Some(stop_trigger),
            interp_thread: None,
            ui,
            translators: TranslatorSet::new(),
            exit_status: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Handle for posting work to the UI loop and submitting deferred
    /// calls from any thread.
    #[must_use]
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Registry of live receiver identities.
    #[must_use]
    pub fn targets(&self) -> &Arc<TargetRegistry> {
        &self.targets
    }

    /// Install locale resources. Idempotent; implied by [`start`].
    ///
    /// Must happen before any UI surface is shown, which is why `start`
    /// performs it before arming the interpreter.
    ///
    /// [`start`]: Shell::start
    pub fn config_translators(&mut self) {
        if self.translators.install(self.config.locale.as_ref())
            && self.state == LifecycleState::Constructed
        {
            self.state = LifecycleState::TranslatorsConfigured;
        }
    }

    /// Compute the shutdown vote on the calling (UI) thread.
    ///
    /// Headless composition always proceeds; interactive composition asks
    /// the surface, which may block on user input. A `false` vote changes
    /// nothing.
    pub fn request_shutdown(&mut self) -> bool {
        handshake::confirm(self.ui.as_deref_mut())
    }

    /// Enter the event loop and block until shutdown.
    ///
    /// The calling thread becomes the UI thread. Returns the exit status
    /// reported by the interpreter; a shell that has already stopped
    /// reports the same status again.
    pub fn start(&mut self) -> i32 {
        if let Some(code) = self.exit_status {
            return code;
        }

        tracing::info!(
            app = %self.config.app_name,
            version = %self.config.app_version,
            "shell starting"
        );
        self.config_translators();

        let (event_loop, endpoint, stop) = match (
            self.event_loop.take(),
            self.endpoint.take(),
            self.stop.take(),
        ) {
            (Some(event_loop), Some(endpoint), Some(stop)) => (event_loop, endpoint, stop),
            _ => {
                tracing::error!("shell started twice without completing");
                return 1;
            }
        };

        // Arm: the gate opens from the loop's first iteration, never
        // synchronously, so the entry point observes a live loop.
        let (start_gate, start_trigger) = Gate::new();
        self.handle.defer(move || start_trigger.open());
        self.state = LifecycleState::InterpreterArmed;
        tracing::debug!("interpreter armed");

        let thread = thread::Builder::new()
            .name(format!("{}-interp", self.config.app_name))
            .spawn(move || endpoint.execute(start_gate))
            .expect("failed to spawn interpreter thread");
        self.interp_thread = Some(thread);
        self.state = LifecycleState::Running;

        let code = event_loop.run(&mut self.ui, &self.relay, &stop);
        self.state = LifecycleState::FinishRequested;

        // The stop gate fired inside the loop; wait for the thread to
        // finish its cooperative drain and terminate on its own.
        if let Some(thread) = self.interp_thread.take() {
            if thread.join().is_err() {
                tracing::error!("interpreter thread terminated by panic");
            }
        }
        self.state = LifecycleState::Stopped;
        self.exit_status = Some(code);
        tracing::info!(code, "shell stopped");
        code
    }

    /// Exit status, once stopped.
    #[must_use]
    pub fn exit_status(&self) -> Option<i32> {
        self.exit_status
    }

    /// Number of queued deferred calls, for observability.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.queue.len()
    }
}
