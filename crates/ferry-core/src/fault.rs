#![forbid(unsafe_code)]

//! Fault values that cross the thread boundary by value.
//!
//! A [`Fault`] is a closed, self-contained description of an interpreter
//! error: a category, an optional stable identifier, and a message payload.
//! It is deliberately not a live error object: it can be cloned, sent to
//! another thread, and compared for equality, which is what lets a fault
//! captured on the UI thread be re-raised on the interpreter thread with
//! full fidelity.

use std::fmt;

/// Category of an interpreter fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Malformed source input.
    Syntax,
    /// Wrong number of arguments to a callable.
    Arity,
    /// Reference to a name that is not defined.
    UndefinedSymbol,
    /// Operation applied to a value of the wrong type.
    Type,
    /// Out-of-range subscript or key.
    Index,
    /// Execution interrupted (e.g. user break).
    Interrupt,
    /// Fault raised explicitly by interpreted code.
    User,
}

impl FaultKind {
    /// Stable lowercase label, used in log output and `Display`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FaultKind::Syntax => "syntax",
            FaultKind::Arity => "arity",
            FaultKind::UndefinedSymbol => "undefined-symbol",
            FaultKind::Type => "type",
            FaultKind::Index => "index",
            FaultKind::Interrupt => "interrupt",
            FaultKind::User => "user",
        }
    }
}

/// A captured interpreter fault.
///
/// Handlers that discriminate on fault kind behave identically whether the
/// fault was raised locally or relayed from another thread, because the
/// whole value (kind, identifier, and message) survives the hop
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    kind: FaultKind,
    identifier: Option<String>,
    message: String,
}

impl Fault {
    /// Create a fault with a kind and message payload.
    #[must_use]
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: None,
            message: message.into(),
        }
    }

    /// Attach a stable identifier (e.g. `ferry:undefined-function`).
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// The fault category.
    #[must_use]
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// The stable identifier, if one was attached.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// The message payload.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            Some(id) => write!(f, "{} error [{id}]: {}", self.kind.as_str(), self.message),
            None => write!(f, "{} error: {}", self.kind.as_str(), self.message),
        }
    }
}

impl std::error::Error for Fault {}
