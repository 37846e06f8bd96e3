//! Runs a [`ReverseSolver`] to completion.
//!
//! The [`Driver`] owns the control loop. It hands the solver the problem
//! setup, the iterate, the workspace, and the task code, then acts on the
//! task the solver returns:
//!
//! - [`Task::NeedFunctionGradient`]: evaluate the objective at `x`
//! - [`Task::NewIterate`]: emit an [`Event`] and ask the observer whether to go on
//! - [`Task::Converged`] or [`Task::Abnormal`]: return a [`Solution`]
//! - [`Task::Error`]: return [`Error::Solver`]
//!
//! The driver never writes `x` and never touches the workspace contents.
//!
//! # Observer Events
//!
//! The driver emits one [`Event`] per completed iteration. Observers can
//! return [`Action::Stop`] to end the run at that iterate; the result then
//! has [`Status::StoppedByObserver`].
//!
//! # Stepping by hand
//!
//! [`Driver::run`] is a loop over [`Driver::step`], [`Driver::supply`], and
//! [`Driver::request_stop`], which are public for callers that need to own
//! the loop themselves, for example to persist a run between iterations with
//! [`Workspace::to_bytes`] and pick it up later with [`Driver::resume`].

mod action;
mod config;
mod error;
mod event;
mod problem;
mod solution;


pub use action::Action;
pub use config::{Config, ConfigError};
pub use error::{Error, InitError};
pub use event::Event;
pub use problem::Problem;
pub use solution::{Solution, Status};

use rcopt_core::{Bound, Bounds, Evaluation, Objective, Observer};

use crate::protocol::{Diagnostics, Iterate, ReverseSolver, Setup, Task, Workspace};

/// Drives a reverse-communication solver through one run.
#[derive(Debug)]
pub struct Driver<S> {
    solver: S,
    bounds: Bounds,
    corrections: usize,
    config: Config,
    iterate: Iterate,
    workspace: Workspace,
    task: Task,
    diagnostics: Diagnostics,
    evaluations: usize,
    steps: usize,
    supplied: bool,
    stop_acknowledged: bool,
}

impl<S: ReverseSolver> Driver<S> {
    /// Validates the problem, allocates the workspace, and sets the task to
    /// [`Task::Start`]. The solver is not called.
    ///
    /// # Errors
    ///
    /// Returns an error if the problem has no variables or no corrections,
    /// if the bound count differs from the dimension, or if any doubly
    /// bounded variable has its lower bound above its upper bound.
    pub fn initialize(problem: Problem, config: Config, solver: S) -> Result<Self, InitError> {
        validate(&problem)?;
        let workspace = Workspace::new(problem.dimension(), problem.corrections)?;
        let iterate = Iterate::new(problem.x0);

        Ok(Self::assemble(
            solver,
            problem.bounds,
            problem.corrections,
            config,
            iterate,
            workspace,
            Task::Start,
        ))
    }

    /// Rebuilds a driver from a persisted iterate, workspace, and task.
    ///
    /// `problem.x0` only fixes the dimension; the run continues from
    /// `iterate`. Evaluation and step counts start again from zero, so the
    /// evaluation budget applies to the resumed part of the run. If `task`
    /// is [`Task::NeedFunctionGradient`], the objective must be supplied
    /// again before the next step.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Driver::initialize`], and also fails if
    /// the iterate or the workspace does not match the problem size.
    pub fn resume(
        problem: Problem,
        config: Config,
        solver: S,
        iterate: Iterate,
        workspace: Workspace,
        task: Task,
    ) -> Result<Self, InitError> {
        validate(&problem)?;
        let n = problem.dimension();
        for len in [iterate.x.len(), iterate.g.len()] {
            if len != n {
                return Err(InitError::DimensionMismatch {
                    expected: n,
                    actual: len,
                });
            }
        }
        if !workspace.fits(n, problem.corrections) {
            return Err(InitError::WorkspaceMismatch {
                dimension: workspace.dimension(),
                corrections: workspace.corrections(),
            });
        }

        Ok(Self::assemble(
            solver,
            problem.bounds,
            problem.corrections,
            config,
            iterate,
            workspace,
            task,
        ))
    }

    fn assemble(
        solver: S,
        bounds: Bounds,
        corrections: usize,
        config: Config,
        iterate: Iterate,
        workspace: Workspace,
        task: Task,
    ) -> Self {
        Self {
            solver,
            bounds,
            corrections,
            config,
            iterate,
            workspace,
            task,
            diagnostics: Diagnostics::default(),
            evaluations: 0,
            steps: 0,
            supplied: false,
            stop_acknowledged: false,
        }
    }

    /// Makes exactly one call into the solver and returns the new task.
    ///
    /// Once the run has finished this is a no-op that returns the final task.
    /// While an evaluation is owed (the task is
    /// [`Task::NeedFunctionGradient`] and [`Driver::supply`] has not been
    /// called since) the solver is not called and the task is returned as is.
    pub fn step(&mut self) -> Task {
        if self.is_finished() {
            return self.task;
        }
        if self.task == Task::NeedFunctionGradient && !self.supplied {
            log::debug!("step skipped: the solver is still waiting for f and g");
            return self.task;
        }

        let stopping = self.task == Task::Stop;
        let setup = Setup {
            corrections: self.corrections,
            bounds: self.bounds.as_slice(),
            factr: self.config.factr(),
            pgtol: self.config.pgtol(),
            verbosity: self.config.verbosity(),
        };
        self.solver.step(
            &setup,
            &mut self.iterate,
            &mut self.workspace,
            &mut self.task,
            &mut self.diagnostics,
        );
        self.steps += 1;
        self.supplied = false;

        if stopping && self.task == Task::Stop {
            self.stop_acknowledged = true;
        }
        log::trace!("step {}: solver returned {}", self.steps, self.task);

        self.task
    }

    /// Evaluates the objective at the current `x` and stores `f` and `g`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolViolation`] if the solver has not asked for
    /// an evaluation or the requested one was already supplied, and
    /// [`Error::EvaluationBudgetExceeded`] if the budget is used up; in
    /// these cases the objective is not called. Objective failures are
    /// returned as [`Error::Objective`].
    pub fn supply<O>(&mut self, objective: &O) -> Result<(), Error>
    where
        O: Objective,
        O::Error: std::error::Error + Send + Sync + 'static,
    {
        if self.task != Task::NeedFunctionGradient || self.supplied {
            return Err(Error::ProtocolViolation { task: self.task });
        }
        let limit = self.config.max_evaluations();
        if self.evaluations >= limit {
            return Err(Error::EvaluationBudgetExceeded { limit });
        }

        self.evaluations += 1;
        let Evaluation { value, gradient } = objective
            .evaluate(&self.iterate.x)
            .map_err(|error| Error::Objective(Box::new(error)))?;

        if gradient.len() != self.iterate.x.len() {
            return Err(Error::GradientLength {
                expected: self.iterate.x.len(),
                actual: gradient.len(),
            });
        }
        self.iterate.f = value;
        self.iterate.g = gradient;
        self.supplied = true;

        Ok(())
    }

    /// Asks the solver to end the run at the current iterate.
    ///
    /// The next [`Driver::step`] lets the solver acknowledge the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolViolation`] unless the task is
    /// [`Task::NewIterate`].
    pub fn request_stop(&mut self) -> Result<(), Error> {
        if self.task != Task::NewIterate {
            return Err(Error::ProtocolViolation { task: self.task });
        }
        self.task = Task::Stop;
        Ok(())
    }

    /// Runs the handshake loop until the solver finishes.
    ///
    /// The observer receives an [`Event`] for every new iterate.
    /// See the [module docs](self) for details.
    ///
    /// # Errors
    ///
    /// Returns an error if the objective fails, the evaluation budget runs
    /// out, the solver rejects its input, or the solver breaks the protocol.
    pub fn run<O, Obs>(&mut self, objective: &O, mut observer: Obs) -> Result<Solution, Error>
    where
        O: Objective,
        O::Error: std::error::Error + Send + Sync + 'static,
        Obs: for<'a> Observer<Event<'a>, Action>,
    {
        loop {
            match self.step() {
                Task::NeedFunctionGradient => self.supply(objective)?,
                Task::NewIterate => {
                    let event = Event::new(&self.iterate, &self.diagnostics);
                    if let Some(Action::Stop) = observer.observe(&event) {
                        self.request_stop()?;
                    }
                }
                Task::Error(error) => return Err(Error::Solver(error)),
                task @ Task::Start => return Err(Error::ProtocolViolation { task }),
                Task::Stop if !self.stop_acknowledged => {
                    return Err(Error::ProtocolViolation { task: Task::Stop });
                }
                Task::Converged(_) | Task::Abnormal(_) | Task::Stop => {
                    let solution = self.solution().ok_or(Error::ProtocolViolation {
                        task: self.task,
                    })?;
                    log::debug!(
                        "run finished with {:?} after {} evaluations",
                        solution.status,
                        solution.evaluations
                    );
                    return Ok(solution);
                }
            }
        }
    }

    /// Runs the handshake loop without observer support.
    ///
    /// This is a convenience wrapper around [`Driver::run`] that uses a no-op observer.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Driver::run`].
    pub fn run_unobserved<O>(&mut self, objective: &O) -> Result<Solution, Error>
    where
        O: Objective,
        O::Error: std::error::Error + Send + Sync + 'static,
    {
        self.run(objective, ())
    }
}

impl<S> Driver<S> {
    /// Returns `true` once the solver has ended the run.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_terminal() || (self.task == Task::Stop && self.stop_acknowledged)
    }

    /// Returns the result if the run has finished.
    #[must_use]
    pub fn solution(&self) -> Option<Solution> {
        let status = match self.task {
            Task::Converged(reason) => Status::Converged(reason),
            Task::Abnormal(reason) => Status::Abnormal(reason),
            Task::Stop if self.stop_acknowledged => Status::StoppedByObserver,
            _ => return None,
        };

        Some(Solution {
            status,
            x: self.iterate.x.clone(),
            f: self.iterate.f,
            g: self.iterate.g.clone(),
            diagnostics: self.diagnostics,
            evaluations: self.evaluations,
            steps: self.steps,
        })
    }

    /// Returns the current task.
    #[must_use]
    pub fn task(&self) -> Task {
        self.task
    }

    /// Returns the current iterate.
    #[must_use]
    pub fn iterate(&self) -> &Iterate {
        &self.iterate
    }

    /// Returns the solver's last diagnostic snapshot.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Returns the number of objective evaluations made so far.
    #[must_use]
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Returns the number of calls into the solver made so far.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Returns the workspace, for persisting a run.
    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Returns the solver.
    #[must_use]
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Returns the config.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Checks sizes and bounds before any memory is allocated.
fn validate(problem: &Problem) -> Result<(), InitError> {
    let n = problem.dimension();
    if n == 0 {
        return Err(InitError::EmptyProblem);
    }
    if problem.corrections == 0 {
        return Err(InitError::NoCorrections);
    }
    if problem.bounds.len() != n {
        return Err(InitError::DimensionMismatch {
            expected: n,
            actual: problem.bounds.len(),
        });
    }

    let inverted = problem
        .bounds
        .as_slice()
        .iter()
        .enumerate()
        .find_map(|(index, bound)| match *bound {
            Bound::LowerAndUpper(lower, upper) if !bound.is_consistent() => {
                Some(InitError::InvalidBounds {
                    index,
                    lower,
                    upper,
                })
            }
            _ => None,
        });
    inverted.map_or(Ok(()), Err)
}
