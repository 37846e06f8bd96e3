use std::convert::Infallible;

use crate::{Evaluation, Objective};

/// A separable weighted quadratic, `f(x) = Σᵢ wᵢ · (xᵢ − cᵢ)²`.
///
/// With positive weights the unconstrained minimizer is `c`, and under box
/// bounds it is `c` projected onto the box, which makes this a convenient
/// problem with an exactly known answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadratic {
    center: Vec<f64>,
    weights: Vec<f64>,
}

impl Quadratic {
    /// Creates a quadratic with unit weights centered at `center`.
    #[must_use]
    pub fn new(center: Vec<f64>) -> Self {
        let weights = vec![1.0; center.len()];
        Self { center, weights }
    }

    /// Replaces the weights.
    ///
    /// # Panics
    ///
    /// Panics if `weights` and the center differ in length.
    #[must_use]
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        assert_eq!(
            weights.len(),
            self.center.len(),
            "one weight per variable is required"
        );
        self.weights = weights;
        self
    }

    /// Returns the unconstrained minimizer.
    #[must_use]
    pub fn center(&self) -> &[f64] {
        &self.center
    }
}

impl Objective for Quadratic {
    type Error = Infallible;

    fn evaluate(&self, x: &[f64]) -> Result<Evaluation, Self::Error> {
        let (value, gradient) = x
            .iter()
            .zip(self.center.iter().zip(&self.weights))
            .map(|(xi, (ci, wi))| {
                let d = xi - ci;
                (wi * d * d, 2.0 * wi * d)
            })
            .fold((0.0, Vec::with_capacity(x.len())), |(sum, mut g), (v, gi)| {
                g.push(gi);
                (sum + v, g)
            });

        Ok(Evaluation::new(value, gradient))
    }
}
