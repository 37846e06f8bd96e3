//! Reusable observers for reverse-communication optimization drivers.
//!
//! This crate provides [`Observer`] implementations and the capability traits
//! they are written against, so the same observer works with any driver whose
//! events and actions implement those traits.
//!
//! # Modules
//!
//! - [`traits`]: capability traits ([`HasIteration`], [`HasObjective`],
//!   [`HasProjectedGradient`], [`CanStop`])
//!
//! # Observers
//!
//! - [`StopAfter`]: stops after a fixed number of iterations
//! - [`ObjectiveTarget`]: stops once the objective reaches a target
//! - [`History`]: records every iterate
//! - [`ProgressLog`]: logs progress through the `log` facade
//!
//! [`Observer`]: rcopt_core::Observer
//! [`HasIteration`]: traits::HasIteration
//! [`HasObjective`]: traits::HasObjective
//! [`HasProjectedGradient`]: traits::HasProjectedGradient
//! [`CanStop`]: traits::CanStop

pub mod traits;

mod history;
mod progress;
mod stop;

pub use history::{History, Record};
pub use progress::ProgressLog;
pub use stop::{ObjectiveTarget, StopAfter};

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use rcopt_core::{Observer, problems::Rosenbrock};
    use rcopt_solvers::{
        driver::{Action, Config, Driver, Event, Problem, Status},
        projected::ProjectedLbfgs,
    };

    fn sample_driver() -> Driver<ProjectedLbfgs> {
        let sample = Rosenbrock::sample_problem(10);
        let problem = Problem::new(sample.x0, sample.bounds, 5);
        Driver::initialize(problem, Config::default(), ProjectedLbfgs::new()).unwrap()
    }

    #[test]
    fn stop_after_ends_the_run_at_that_iteration() {
        let mut driver = sample_driver();
        let solution = driver.run(&Rosenbrock, StopAfter::new(2)).unwrap();

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(solution.diagnostics.iteration, 2);
    }

    #[test]
    fn history_sees_every_iterate() {
        let mut history = History::new();
        let mut driver = sample_driver();
        let solution = driver.run(&Rosenbrock, &mut history).unwrap();

        let last = history.last().unwrap();
        assert_eq!(history.records().len(), solution.diagnostics.iteration);
        assert_eq!(last.iteration, solution.diagnostics.iteration);
        assert_relative_eq!(last.objective, solution.f);
        assert!(history.is_monotone());
    }

    #[test]
    fn observers_combine_in_a_closure() {
        let mut history = History::new();
        let mut target = ObjectiveTarget::new(f64::INFINITY);
        let mut driver = sample_driver();

        let solution = driver
            .run(&Rosenbrock, |event: &Event<'_>| -> Option<Action> {
                Observer::<_, Action>::observe(&mut history, event);
                target.observe(event)
            })
            .unwrap();

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(history.records().len(), 1);
    }
}
