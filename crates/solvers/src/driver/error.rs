use thiserror::Error;

use crate::protocol::{InputError, Task, WorkspaceError};

/// Errors that can occur during a driven run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("evaluation budget of {limit} exhausted")]
    EvaluationBudgetExceeded { limit: usize },

    #[error("objective error: {0}")]
    Objective(Box<dyn std::error::Error + Send + Sync>),

    #[error("objective returned {actual} gradient entries for {expected} variables")]
    GradientLength { expected: usize, actual: usize },

    #[error("solver rejected its input: {0}")]
    Solver(InputError),

    #[error("operation not allowed while the task is {task}")]
    ProtocolViolation { task: Task },
}

/// Errors that can occur when creating or resuming a driver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InitError {
    #[error("problem has no variables")]
    EmptyProblem,

    #[error("correction count must be positive")]
    NoCorrections,

    #[error("expected {expected} entries, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("variable {index} has lower bound {lower} above upper bound {upper}")]
    InvalidBounds { index: usize, lower: f64, upper: f64 },

    #[error("workspace sized for n = {dimension}, m = {corrections} does not match the problem")]
    WorkspaceMismatch { dimension: usize, corrections: usize },

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}
