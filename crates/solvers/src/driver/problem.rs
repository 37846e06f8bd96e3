use rcopt_core::Bounds;

/// A bound-constrained minimization problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Starting point; its length is the problem dimension `n`.
    pub x0: Vec<f64>,

    /// One bound per variable.
    pub bounds: Bounds,

    /// Number of limited-memory corrections `m`. Values between 3 and 20
    /// are usual; values below 3 are not recommended.
    pub corrections: usize,
}

impl Problem {
    /// Creates a problem from a starting point, bounds, and correction count.
    #[must_use]
    pub fn new(x0: Vec<f64>, bounds: Bounds, corrections: usize) -> Self {
        Self {
            x0,
            bounds,
            corrections,
        }
    }

    /// Creates a problem with no bounds on any variable.
    #[must_use]
    pub fn unbounded(x0: Vec<f64>, corrections: usize) -> Self {
        let bounds = Bounds::unbounded(x0.len());
        Self::new(x0, bounds, corrections)
    }

    /// Returns the problem dimension `n`.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.x0.len()
    }
}
