//! Capability traits for solver-agnostic observers.
//!
//! These traits abstract over driver-specific event and action types, so an
//! observer can be written once and used with any driver whose events and
//! actions implement them.
//!
//! # Event traits
//!
//! - [`HasIteration`]: events that carry an iteration count
//! - [`HasObjective`]: events that carry an objective value
//! - [`HasProjectedGradient`]: events that carry a projected-gradient norm
//!
//! # Action traits
//!
//! - [`CanStop`]: actions that can end the run
//!
//! # Example
//!
//! ```rust
//! use rcopt_core::Observer;
//! use rcopt_observers::traits::{CanStop, HasProjectedGradient};
//!
//! struct GoodEnough {
//!     tolerance: f64,
//! }
//!
//! impl<E: HasProjectedGradient, A: CanStop> Observer<E, A> for GoodEnough {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.projected_gradient_norm() < self.tolerance).then(A::stop)
//!     }
//! }
//! ```

use rcopt_solvers::driver;

/// An event that carries the number of completed iterations.
pub trait HasIteration {
    /// Returns the number of completed iterations.
    fn iteration(&self) -> usize;
}

/// An event that carries an objective value.
pub trait HasObjective {
    /// Returns the objective at the reported point.
    fn objective(&self) -> f64;
}

/// An event that carries the infinity norm of the projected gradient.
pub trait HasProjectedGradient {
    /// Returns `max |proj g_i|` at the reported point.
    fn projected_gradient_norm(&self) -> f64;
}

/// An action type that can end a run.
pub trait CanStop {
    /// Returns the action that stops the run.
    fn stop() -> Self;
}

impl HasIteration for driver::Event<'_> {
    fn iteration(&self) -> usize {
        self.diagnostics().iteration
    }
}

impl HasObjective for driver::Event<'_> {
    fn objective(&self) -> f64 {
        self.f()
    }
}

impl HasProjectedGradient for driver::Event<'_> {
    fn projected_gradient_norm(&self) -> f64 {
        self.diagnostics().projected_gradient_norm
    }
}

impl CanStop for driver::Action {
    fn stop() -> Self {
        Self::Stop
    }
}
