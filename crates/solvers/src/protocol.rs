//! The reentrant handshake between a caller and a reverse-communication solver.
//!
//! One round of the protocol is a single call to [`ReverseSolver::step`]. The
//! caller passes the problem [`Setup`], the current [`Iterate`], the opaque
//! [`Workspace`], the [`Task`] code, and the [`Diagnostics`] snapshot. The
//! solver mutates them and returns. The returned task says what happens next:
//!
//! | Task                         | Caller's next move                                  |
//! |------------------------------|-----------------------------------------------------|
//! | [`Task::NeedFunctionGradient`] | evaluate `f` and `g` at `x`, then step again      |
//! | [`Task::NewIterate`]         | inspect the iterate; step again or write [`Task::Stop`] |
//! | [`Task::Converged`]          | done                                                |
//! | [`Task::Abnormal`]           | done, best point found is in the iterate            |
//! | [`Task::Error`]              | done, the solver rejected its input                 |
//!
//! The caller must never read or write the workspace; it only keeps it alive
//! and unchanged between calls.

mod diagnostics;
mod task;
mod verbosity;
mod workspace;

pub use diagnostics::Diagnostics;
pub use task::{Abnormality, Convergence, InputError, Task};
pub use verbosity::Verbosity;
pub use workspace::{Workspace, WorkspaceError, WorkspaceMut};

use rcopt_core::Bound;

/// Per-call problem data that the solver reads but never modifies.
#[derive(Debug, Clone, Copy)]
pub struct Setup<'a> {
    /// Number of limited-memory corrections (`m`).
    pub corrections: usize,

    /// One bound per variable; its length is the problem dimension `n`.
    pub bounds: &'a [Bound],

    /// Relative function-decrease tolerance factor (0 disables the test).
    pub factr: f64,

    /// Projected-gradient tolerance (0 disables the test).
    pub pgtol: f64,

    /// How much the solver reports.
    pub verbosity: Verbosity,
}

impl Setup<'_> {
    /// Returns the problem dimension `n`.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.bounds.len()
    }
}

/// The point the solver is working on, with its objective value and gradient.
///
/// The solver writes `x`; the caller writes `f` and `g` after evaluating the
/// objective at `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Iterate {
    /// Current point.
    pub x: Vec<f64>,

    /// Objective value at `x`.
    pub f: f64,

    /// Gradient at `x`.
    pub g: Vec<f64>,
}

impl Iterate {
    /// Creates an iterate at `x0` with no evaluation yet.
    #[must_use]
    pub fn new(x0: Vec<f64>) -> Self {
        let n = x0.len();
        Self {
            x: x0,
            f: 0.0,
            g: vec![0.0; n],
        }
    }
}

/// A solver reached through reverse communication.
///
/// Implementations must keep every piece of state that has to survive between
/// calls in the [`Workspace`]. Two runs that start from the same workspace
/// bytes, iterate, and task must produce the same sequence of tasks.
pub trait ReverseSolver {
    /// Advances the solver by one handshake round.
    ///
    /// On return, `task` holds the solver's request. The solver only writes
    /// `diagnostics` when it reports a [`Task::NewIterate`] or finishes.
    fn step(
        &mut self,
        setup: &Setup<'_>,
        iterate: &mut Iterate,
        workspace: &mut Workspace,
        task: &mut Task,
        diagnostics: &mut Diagnostics,
    );
}

impl<S: ReverseSolver + ?Sized> ReverseSolver for &mut S {
    fn step(
        &mut self,
        setup: &Setup<'_>,
        iterate: &mut Iterate,
        workspace: &mut Workspace,
        task: &mut Task,
        diagnostics: &mut Diagnostics,
    ) {
        (**self).step(setup, iterate, workspace, task, diagnostics);
    }
}
