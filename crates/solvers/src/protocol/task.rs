use std::fmt;

use thiserror::Error;

/// The task code exchanged on every handshake round.
///
/// The solver owns every transition. The caller may write a task only twice:
/// [`Task::Start`] before the first call, and [`Task::Stop`] after a
/// [`Task::NewIterate`] to end the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Task {
    /// Begin a new run.
    Start,

    /// Evaluate the objective and its gradient at the current `x`.
    NeedFunctionGradient,

    /// An iteration finished; `x`, `f`, and `g` describe the new iterate.
    NewIterate,

    /// A convergence test was satisfied.
    Converged(Convergence),

    /// The solver could not make further progress; the iterate is the best found.
    Abnormal(Abnormality),

    /// The solver rejected its input.
    Error(InputError),

    /// The caller asked the solver to stop.
    Stop,
}

impl Task {
    /// Returns `true` for [`Converged`], [`Abnormal`], and [`Error`].
    ///
    /// [`Task::Stop`] is not terminal until the solver has seen it, so the
    /// caller must still step once after writing it.
    ///
    /// [`Converged`]: Task::Converged
    /// [`Abnormal`]: Task::Abnormal
    /// [`Error`]: Task::Error
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Converged(_) | Self::Abnormal(_) | Self::Error(_))
    }

    /// Returns the solver's diagnostic text for this task.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("START"),
            Self::NeedFunctionGradient => f.write_str("FG"),
            Self::NewIterate => f.write_str("NEW_X"),
            Self::Converged(reason) => write!(f, "CONVERGENCE: {reason}"),
            Self::Abnormal(reason) => write!(f, "ABNORMAL: {reason}"),
            Self::Error(error) => write!(f, "ERROR: {error}"),
            Self::Stop => f.write_str("STOP: requested by caller"),
        }
    }
}

/// Which convergence test ended the run.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Convergence {
    /// `max |proj g_i| <= pgtol`.
    #[error("norm of projected gradient <= pgtol")]
    ProjectedGradient,

    /// `(f_prev - f) / max(|f_prev|, |f|, 1) <= factr * epsmch`.
    #[error("relative reduction of f <= factr*epsmch")]
    RelativeReduction,
}

/// Why the solver stopped without satisfying a convergence test.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abnormality {
    #[error("line search could not find a point with sufficient decrease")]
    LineSearch,

    #[error("no descent direction exists at the current point")]
    NoDescent,

    #[error("the projected step no longer changes the iterate")]
    Stagnation,

    #[error("objective returned a non-finite value at the starting point")]
    NonFiniteStart,
}

/// Input the solver rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputError {
    #[error("n must be positive")]
    EmptyProblem,

    #[error("m must be positive")]
    NoCorrections,

    #[error("x, g, and the bounds must all have length n")]
    DimensionMismatch,

    #[error("factr must be non-negative")]
    NegativeFactr,

    #[error("pgtol must be non-negative")]
    NegativePgtol,

    #[error("variable {index} has lower bound above upper bound")]
    InvalidBounds { index: usize },

    #[error("workspace does not match the problem or the solver's phase")]
    Workspace,
}
