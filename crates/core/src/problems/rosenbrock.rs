use crate::{Bound, Bounds, DomainError, Evaluation, Objective};

/// The extended Rosenbrock function.
///
/// ```text
/// f(x) = 4 · [ 0.25 · (x₀ − 1)² + Σᵢ (xᵢ − xᵢ₋₁²)² ]
/// ```
///
/// Its domain is all of ℝⁿ; non-finite coordinates are rejected with a
/// [`DomainError`]. The gradient is computed analytically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rosenbrock;

/// A starting point paired with the bounds it is meant to be solved under.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleProblem {
    /// Initial estimate of the solution.
    pub x0: Vec<f64>,

    /// Bounds on the variables.
    pub bounds: Bounds,
}

impl Rosenbrock {
    /// Returns the classic bounded Rosenbrock sample problem with `n` variables.
    ///
    /// Counting variables from 1:
    ///
    /// - odd-numbered variables have bounds `[1, 100]`, even-numbered `[100, 100]`
    /// - variables 1–5 only use their lower bound, 6–10 are unbounded, and the
    ///   rest use both bounds
    /// - the start is `-5` for variables 1–5 and `300` for the rest
    ///
    /// Several starting coordinates violate their bounds on purpose; the
    /// solver projects them onto the feasible box.
    #[must_use]
    pub fn sample_problem(n: usize) -> SampleProblem {
        let bounds = (1..=n)
            .map(|i| {
                let lower = if i % 2 == 1 { 1.0 } else { 100.0 };
                let upper = 100.0;
                if i < 6 {
                    Bound::Lower(lower)
                } else if i < 11 {
                    Bound::Unbounded
                } else {
                    Bound::LowerAndUpper(lower, upper)
                }
            })
            .collect();

        let x0 = (1..=n).map(|i| if i < 6 { -5.0 } else { 300.0 }).collect();

        SampleProblem {
            x0,
            bounds: Bounds(bounds),
        }
    }
}

impl Objective for Rosenbrock {
    type Error = DomainError;

    fn evaluate(&self, x: &[f64]) -> Result<Evaluation, Self::Error> {
        DomainError::check_finite(x)?;

        let Some(&first) = x.first() else {
            return Ok(Evaluation::new(0.0, Vec::new()));
        };

        let mut value = 0.25 * (first - 1.0).powi(2);
        let mut gradient = vec![0.0; x.len()];
        gradient[0] = 2.0 * (first - 1.0);

        for i in 1..x.len() {
            let t = x[i] - x[i - 1] * x[i - 1];
            value += t * t;
            gradient[i - 1] -= 16.0 * x[i - 1] * t;
            gradient[i] += 8.0 * t;
        }

        Ok(Evaluation::new(4.0 * value, gradient))
    }
}
