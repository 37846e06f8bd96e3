//! Driving bound-constrained quasi-Newton optimizers through reverse communication.
//!
//! A reverse-communication solver never calls user code. Each call to its
//! step function does a bounded amount of work and returns a [`Task`] that
//! tells the caller what to do next: evaluate the objective, inspect a new
//! iterate, or stop. All solver state between calls lives in an opaque
//! [`Workspace`] owned by the caller.
//!
//! # Modules
//!
//! - [`protocol`]: task codes, workspace, diagnostics, and the
//!   [`ReverseSolver`] step-function trait
//! - [`driver`]: the [`Driver`] that runs the handshake loop against an
//!   [`Objective`] and an [`Observer`]
//! - [`projected`]: [`ProjectedLbfgs`], a compact projected limited-memory
//!   backend that keeps all of its state in the workspace
//!
//! [`Task`]: protocol::Task
//! [`Workspace`]: protocol::Workspace
//! [`ReverseSolver`]: protocol::ReverseSolver
//! [`Driver`]: driver::Driver
//! [`ProjectedLbfgs`]: projected::ProjectedLbfgs
//! [`Objective`]: rcopt_core::Objective
//! [`Observer`]: rcopt_core::Observer

pub mod driver;
pub mod projected;
pub mod protocol;
