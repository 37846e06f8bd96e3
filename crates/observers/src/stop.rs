use rcopt_core::Observer;

use crate::traits::{CanStop, HasIteration, HasObjective};

/// Stops the run once a given number of iterations has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopAfter {
    iterations: usize,
}

impl StopAfter {
    /// Creates an observer that stops after `iterations` iterations.
    #[must_use]
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }
}

impl<E: HasIteration, A: CanStop> Observer<E, A> for StopAfter {
    fn observe(&mut self, event: &E) -> Option<A> {
        (event.iteration() >= self.iterations).then(A::stop)
    }
}

/// Stops the run once the objective reaches a target value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveTarget {
    target: f64,
}

impl ObjectiveTarget {
    /// Creates an observer that stops once `f <= target`.
    #[must_use]
    pub fn new(target: f64) -> Self {
        Self { target }
    }
}

impl<E: HasObjective, A: CanStop> Observer<E, A> for ObjectiveTarget {
    fn observe(&mut self, event: &E) -> Option<A> {
        (event.objective() <= self.target).then(A::stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Event {
        iteration: usize,
        f: f64,
    }

    impl HasIteration for Event {
        fn iteration(&self) -> usize {
            self.iteration
        }
    }

    impl HasObjective for Event {
        fn objective(&self) -> f64 {
            self.f
        }
    }

    #[derive(Debug, PartialEq)]
    struct Stop;

    impl CanStop for Stop {
        fn stop() -> Self {
            Stop
        }
    }

    #[test]
    fn stop_after_counts_iterations() {
        let mut observer = StopAfter::new(3);
        let at = |iteration| Event { iteration, f: 0.0 };

        assert_eq!(Observer::<_, Stop>::observe(&mut observer, &at(2)), None);
        assert_eq!(observer.observe(&at(3)), Some(Stop));
    }

    #[test]
    fn objective_target_is_inclusive() {
        let mut observer = ObjectiveTarget::new(1.0);
        let with = |f| Event { iteration: 1, f };

        assert_eq!(Observer::<_, Stop>::observe(&mut observer, &with(1.5)), None);
        assert_eq!(observer.observe(&with(1.0)), Some(Stop));
        assert_eq!(Observer::<_, Stop>::observe(&mut observer, &with(f64::NAN)), None);
    }
}
