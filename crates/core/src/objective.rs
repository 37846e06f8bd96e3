use thiserror::Error;

/// An objective value and its gradient at a single point.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// The objective value `f(x)`.
    pub value: f64,

    /// The gradient `∇f(x)`, one entry per variable.
    pub gradient: Vec<f64>,
}

impl Evaluation {
    /// Creates a new evaluation.
    #[must_use]
    pub fn new(value: f64, gradient: Vec<f64>) -> Self {
        Self { value, gradient }
    }
}

/// A smooth objective that can be minimized by a gradient-based solver.
///
/// Implementations must be pure: evaluating the same `x` twice yields
/// bit-identical results, and evaluation has no side effects. Solvers rely on
/// this to keep their internal state consistent with the reported iterate.
pub trait Objective {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Evaluates the objective and its gradient at `x`.
    ///
    /// The returned gradient must have the same length as `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if `x` is outside the objective's domain.
    fn evaluate(&self, x: &[f64]) -> Result<Evaluation, Self::Error>;
}

impl<T: Objective + ?Sized> Objective for &T {
    type Error = T::Error;

    fn evaluate(&self, x: &[f64]) -> Result<Evaluation, Self::Error> {
        (**self).evaluate(x)
    }
}

/// A point lies outside the domain on which an objective is defined.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("x[{index}] = {value} is outside the objective's domain")]
pub struct DomainError {
    /// Index of the offending coordinate.
    pub index: usize,

    /// Value of the offending coordinate.
    pub value: f64,
}

impl DomainError {
    /// Checks that every coordinate of `x` is finite.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first non-finite coordinate.
    pub fn check_finite(x: &[f64]) -> Result<(), Self> {
        match x.iter().position(|v| !v.is_finite()) {
            Some(index) => Err(Self {
                index,
                value: x[index],
            }),
            None => Ok(()),
        }
    }
}
