use crate::protocol::{Diagnostics, Iterate};

/// A new iterate reported by the solver.
///
/// Emitted once per completed iteration, after the solver returns
/// [`Task::NewIterate`](crate::protocol::Task::NewIterate).
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    iterate: &'a Iterate,
    diagnostics: &'a Diagnostics,
}

impl<'a> Event<'a> {
    pub(super) fn new(iterate: &'a Iterate, diagnostics: &'a Diagnostics) -> Self {
        Self {
            iterate,
            diagnostics,
        }
    }

    /// Returns the current point.
    #[must_use]
    pub fn x(&self) -> &'a [f64] {
        &self.iterate.x
    }

    /// Returns the objective value at the current point.
    #[must_use]
    pub fn f(&self) -> f64 {
        self.iterate.f
    }

    /// Returns the gradient at the current point.
    #[must_use]
    pub fn g(&self) -> &'a [f64] {
        &self.iterate.g
    }

    /// Returns the solver's diagnostic snapshot.
    #[must_use]
    pub fn diagnostics(&self) -> &'a Diagnostics {
        self.diagnostics
    }
}
