use crate::protocol::{Abnormality, Convergence, Diagnostics};

/// How a driven run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A convergence test was satisfied.
    Converged(Convergence),

    /// The solver could not make further progress.
    ///
    /// This is not an error; the solution holds the best point found.
    Abnormal(Abnormality),

    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

/// The result of a driven run.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Final status.
    pub status: Status,

    /// Final point.
    pub x: Vec<f64>,

    /// Objective value at `x`.
    pub f: f64,

    /// Gradient at `x`.
    pub g: Vec<f64>,

    /// The solver's last diagnostic snapshot.
    pub diagnostics: Diagnostics,

    /// Objective evaluations made by the driver.
    pub evaluations: usize,

    /// Calls into the solver made by the driver.
    pub steps: usize,
}
