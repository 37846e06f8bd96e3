use rcopt_core::Observer;

use crate::traits::{HasIteration, HasObjective, HasProjectedGradient};

/// Logs the objective and projected-gradient norm at `info` level.
///
/// Logs every `every`-th iteration; an interval of zero is treated as one.
/// The observer never acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressLog {
    every: usize,
}

impl ProgressLog {
    /// Creates an observer that logs every `every` iterations.
    #[must_use]
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }

    /// Returns `true` if the given iteration is logged.
    #[must_use]
    pub fn logs(&self, iteration: usize) -> bool {
        iteration % self.every == 0
    }
}

impl Default for ProgressLog {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<E, A> Observer<E, A> for ProgressLog
where
    E: HasIteration + HasObjective + HasProjectedGradient,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        let iteration = event.iteration();
        if self.logs(iteration) {
            log::info!(
                "iteration {iteration}: f = {:.8e}, |proj g| = {:.3e}",
                event.objective(),
                event.projected_gradient_norm()
            );
        }
        None
    }
}
