//! Ready-made objectives.
//!
//! - [`Rosenbrock`]: the extended Rosenbrock function, with the classic
//!   bounded sample problem from the L-BFGS-B distribution
//! - [`Quadratic`]: a separable weighted quadratic with a known minimizer

pub mod quadratic;
pub mod rosenbrock;

pub use quadratic::Quadratic;
pub use rosenbrock::{Rosenbrock, SampleProblem};
