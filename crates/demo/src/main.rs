//! Solves the 25-variable bounded Rosenbrock sample problem.
//!
//! Progress goes to stdout through `env_logger` (filter with `RUST_LOG`), and
//! the solver writes its run summary to `iterate.dat` in the working
//! directory.

use std::error::Error;

use env_logger::{Builder, Env, Target};
use rcopt_core::problems::Rosenbrock;
use rcopt_observers::History;
use rcopt_solvers::{
    driver::{Config, Driver, Problem},
    projected::ProjectedLbfgs,
    protocol::Verbosity,
};

const DIMENSION: usize = 25;
const CORRECTIONS: usize = 5;

fn main() -> Result<(), Box<dyn Error>> {
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .init();

    let sample = Rosenbrock::sample_problem(DIMENSION);
    let problem = Problem::new(sample.x0, sample.bounds, CORRECTIONS);
    let config = Config::default().with_verbosity(Verbosity::every(1));
    let solver = ProjectedLbfgs::with_summary("iterate.dat");

    let mut history = History::new();
    let mut driver = Driver::initialize(problem, config, solver)?;
    let solution = driver.run(&Rosenbrock, &mut history)?;

    log::info!("status: {:?}", solution.status);
    log::info!(
        "f = {:.8e} after {} iterations and {} evaluations",
        solution.f,
        solution.diagnostics.iteration,
        solution.evaluations
    );
    log::info!("x = {:?}", solution.x);
    if !history.is_monotone() {
        log::warn!("objective increased between iterates");
    }

    Ok(())
}
