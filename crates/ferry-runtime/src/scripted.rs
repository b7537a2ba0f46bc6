#![forbid(unsafe_code)]

//! Deterministic interpreter double for testing.
//!
//! `ScriptedInterpreter` runs a fixed list of steps against the context
//! and returns a fixed exit status, so lifecycle behavior can be exercised
//! without a real language runtime.
//!
//! # Example
//!
//! ```ignore
//! let interp = ScriptedInterpreter::new(0)
//!     .step(|ctx| assert!(ctx.ui_live()));
//! let mut shell = Shell::headless(Box::new(interp));
//! assert_eq!(shell.start(), 0);
//! ```

use crate::interp::{Interpreter, InterpreterContext};

type Step = Box<dyn FnOnce(&InterpreterContext) + Send>;

/// An interpreter that executes queued steps, then exits.
pub struct ScriptedInterpreter {
    steps: Vec<Step>,
    exit_status: i32,
}

impl ScriptedInterpreter {
    /// Create a script that immediately exits with the given status.
    #[must_use]
    pub fn new(exit_status: i32) -> Self {
        Self {
            steps: Vec::new(),
            exit_status,
        }
    }

    /// Append a step. Steps run in order, once each.
    #[must_use]
    pub fn step(mut self, f: impl FnOnce(&InterpreterContext) + Send + 'static) -> Self {
        self.steps.push(Box::new(f));
        self
    }
}

impl Interpreter for ScriptedInterpreter {
    fn run(&mut self, ctx: &InterpreterContext) -> i32 {
        for step in self.steps.drain(..) {
            step(ctx);
        }
        self.exit_status
    }
}
