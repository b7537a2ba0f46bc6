#![forbid(unsafe_code)]

//! Ferry core types: deferred calls, the callback queue, receiver
//! identities, and fault values.
//!
//! This crate holds the leaf data model of the interpreter/UI bridge and
//! deliberately carries no thread or lifecycle policy; that lives in
//! `ferry-runtime`. Everything here is safe to construct on one thread and
//! consume on another.
//!
//! # Key Components
//!
//! - [`DeferredCall`] - An immutable unit of work with a stable [`CallId`]
//! - [`CallbackQueue`] - FIFO, exactly-once inbox for the interpreter thread
//! - [`TargetRegistry`] - Live-receiver set consulted at execution time
//! - [`Fault`] - A captured fault value that crosses threads with full
//!   fidelity

pub mod call;
pub mod fault;
pub mod queue;
pub mod target;

pub use call::{CallBody, CallId, DeferredCall};
pub use fault::{Fault, FaultKind};
pub use queue::CallbackQueue;
pub use target::{TargetGuard, TargetId, TargetRegistry};
