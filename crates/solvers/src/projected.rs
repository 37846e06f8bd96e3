//! A compact projected limited-memory BFGS solver.
//!
//! # Algorithm
//!
//! Each iteration computes a quasi-Newton direction from the stored
//! correction pairs with the two-loop recursion, applied to the gradient
//! with variables held at a bound masked out. The trial point is the
//! projection of `x0 + stp·d` onto the bounds. A backtracking line search
//! with safeguarded quadratic interpolation enforces sufficient decrease
//! along that projected path. When the quasi-Newton direction fails, the
//! memory is discarded and the iteration retries with steepest descent.
//!
//! Every value that must survive between handshake rounds lives in the
//! [`Workspace`], so a run can be persisted with
//! [`Workspace::to_bytes`] and resumed on a fresh solver.
//!
//! # Limitations
//!
//! This is not L-BFGS-B: there is no generalized Cauchy point, no subspace
//! minimization and no Moré–Thuente line search. It converges reliably on
//! smooth problems but will usually need more evaluations.

mod memory;
mod report;
mod state;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use rcopt_core::Bound;

use crate::protocol::{
    Abnormality, Convergence, Diagnostics, InputError, Iterate, ReverseSolver, Setup, Task,
    Workspace,
};

use report::Report;
use state::{Phase, State, VarStatus};

/// Sufficient-decrease constant of the Armijo condition.
/// A trial must also strictly lower `f`.
const ARMIJO: f64 = 1e-4;

/// Backtracks allowed before a line search is declared failed.
const MAX_BACKTRACKS: usize = 20;

/// Bounds on the interpolated step reduction factor.
const SHRINK_MIN: f64 = 0.1;
const SHRINK_MAX: f64 = 0.5;

/// Projected L-BFGS reached through reverse communication.
///
/// The solver itself holds no run state, only the optional path of a
/// per-run summary file written when the verbosity is positive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectedLbfgs {
    summary: Option<PathBuf>,
}

impl ProjectedLbfgs {
    /// Creates a solver without a summary file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a solver that writes a per-run summary to `path`.
    ///
    /// The file is only written when the verbosity is positive, and is
    /// replaced at the start of every run.
    #[must_use]
    pub fn with_summary(path: impl Into<PathBuf>) -> Self {
        Self {
            summary: Some(path.into()),
        }
    }

    /// Returns the summary file path, if any.
    #[must_use]
    pub fn summary_path(&self) -> Option<&Path> {
        self.summary.as_deref()
    }
}

impl ReverseSolver for ProjectedLbfgs {
    fn step(
        &mut self,
        setup: &Setup<'_>,
        iterate: &mut Iterate,
        workspace: &mut Workspace,
        task: &mut Task,
        diagnostics: &mut Diagnostics,
    ) {
        if task.is_terminal() {
            return;
        }

        let report = Report::new(setup.verbosity, self.summary_path());

        if *task == Task::Start {
            *task = match validate(setup, iterate, workspace) {
                Ok(()) => {
                    let view = workspace.solver_view();
                    let state = State::new(setup.dimension(), setup.corrections, view);
                    Run { setup, iterate, state, report }.start()
                }
                Err(error) => Task::Error(error),
            };
            return;
        }

        if let Err(error) = check_shape(setup, iterate, workspace) {
            *task = Task::Error(error);
            return;
        }

        let view = workspace.solver_view();
        let state = State::new(setup.dimension(), setup.corrections, view);
        let mut run = Run { setup, iterate, state, report };

        let next = match (*task, run.state.phase()) {
            (Task::NeedFunctionGradient, Some(Phase::InitialEval)) => run.after_initial_eval(),
            (Task::NeedFunctionGradient, Some(Phase::LineSearch)) => run.after_trial(),
            (Task::NewIterate, Some(Phase::NewIterate)) => run.test_convergence(),
            (Task::Stop, Some(Phase::NewIterate)) => run.finish(Task::Stop),
            (Task::Stop, Some(Phase::Done)) => Task::Stop,
            _ => Task::Error(InputError::Workspace),
        };

        if next != Task::NeedFunctionGradient && !matches!(next, Task::Error(_)) {
            *diagnostics = run.state.diagnostics();
        }
        *task = next;
    }
}

/// Checks everything the solver needs before starting a run.
fn validate(
    setup: &Setup<'_>,
    iterate: &Iterate,
    workspace: &Workspace,
) -> Result<(), InputError> {
    if setup.dimension() == 0 {
        return Err(InputError::EmptyProblem);
    }
    if setup.corrections == 0 {
        return Err(InputError::NoCorrections);
    }
    if setup.factr.is_nan() || setup.factr < 0.0 {
        return Err(InputError::NegativeFactr);
    }
    if setup.pgtol.is_nan() || setup.pgtol < 0.0 {
        return Err(InputError::NegativePgtol);
    }
    if let Some(index) = setup.bounds.iter().position(|bound| !bound.is_consistent()) {
        return Err(InputError::InvalidBounds { index });
    }
    check_shape(setup, iterate, workspace)
}

/// Checks that the iterate and workspace still match the problem size.
fn check_shape(
    setup: &Setup<'_>,
    iterate: &Iterate,
    workspace: &Workspace,
) -> Result<(), InputError> {
    let n = setup.dimension();
    if iterate.x.len() != n || iterate.g.len() != n {
        return Err(InputError::DimensionMismatch);
    }
    if !workspace.fits(n, setup.corrections) {
        return Err(InputError::Workspace);
    }
    Ok(())
}

/// Where variable `x` sits relative to `bound`.
fn classify(bound: &Bound, x: f64) -> VarStatus {
    match *bound {
        Bound::LowerAndUpper(l, u) if l == u => VarStatus::Fixed,
        _ if bound.lower().is_some_and(|l| x <= l) => VarStatus::AtLower,
        _ if bound.upper().is_some_and(|u| x >= u) => VarStatus::AtUpper,
        _ => VarStatus::Free,
    }
}

/// Returns `true` if the gradient pushes variable `i` further into its bound.
fn is_held(status: VarStatus, g: f64) -> bool {
    match status {
        VarStatus::Free => false,
        VarStatus::AtLower => g > 0.0,
        VarStatus::AtUpper => g < 0.0,
        VarStatus::Fixed => true,
    }
}

/// Infinity norm of the projected gradient.
fn projected_gradient_norm(bounds: &[Bound], x: &[f64], g: &[f64]) -> f64 {
    bounds
        .iter()
        .zip(x.iter().zip(g))
        .map(|(bound, (&x, &g))| {
            let pg = if g < 0.0 {
                bound.upper().map_or(g, |u| (x - u).max(g))
            } else {
                bound.lower().map_or(g, |l| (x - l).min(g))
            };
            pg.abs()
        })
        .fold(0.0, f64::max)
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// One handshake round with the workspace unpacked.
struct Run<'s, 'w> {
    setup: &'s Setup<'s>,
    iterate: &'s mut Iterate,
    state: State<'w>,
    report: Report<'s>,
}

impl Run<'_, '_> {
    /// Projects `x0` onto the bounds and asks for the first evaluation.
    fn start(mut self) -> Task {
        self.state.clear_saved();
        self.state.set_epsmch(f64::EPSILON);

        let mut infeasible = false;
        for (x, bound) in self.iterate.x.iter_mut().zip(self.setup.bounds) {
            let projected = bound.project(*x);
            if projected.to_bits() != x.to_bits() {
                infeasible = true;
                *x = projected;
            }
        }

        let bounds = self.setup.bounds;
        let has_bounds = bounds.iter().any(|b| !matches!(b, Bound::Unbounded));
        let all_doubly = bounds.iter().all(|b| matches!(b, Bound::LowerAndUpper(..)));
        self.state.set_flags(infeasible, has_bounds, all_doubly);

        self.refresh_status();
        self.state.remember_status();
        self.state.set_phase(Phase::InitialEval);

        let at_bounds = self.state.diagnostics().active_constraints;
        self.report
            .start(self.state.n(), self.state.m(), infeasible, at_bounds);

        Task::NeedFunctionGradient
    }

    /// Handles the evaluation at the starting point.
    fn after_initial_eval(&mut self) -> Task {
        self.state.count_evaluation();

        if !self.iterate.f.is_finite() || !all_finite(&self.iterate.g) {
            return self.finish(Task::Abnormal(Abnormality::NonFiniteStart));
        }

        self.refresh_status();
        self.refresh_pg_norm();

        if self.setup.pgtol > 0.0 && self.state.pg_norm() <= self.setup.pgtol {
            return self.finish(Task::Converged(Convergence::ProjectedGradient));
        }

        self.begin_iteration()
    }

    /// Applies the convergence tests to the iterate just reported.
    fn test_convergence(&mut self) -> Task {
        let (pgtol, factr) = (self.setup.pgtol, self.setup.factr);

        if pgtol > 0.0 && self.state.pg_norm() <= pgtol {
            return self.finish(Task::Converged(Convergence::ProjectedGradient));
        }

        if factr > 0.0 {
            let (f_prev, f) = (self.state.f_prev(), self.iterate.f);
            let scale = f_prev.abs().max(f.abs()).max(1.0);
            if (f_prev - f) / scale <= factr * self.state.epsmch() {
                return self.finish(Task::Converged(Convergence::RelativeReduction));
            }
        }

        self.begin_iteration()
    }

    /// Saves the current point, picks a direction, and proposes the first trial.
    fn begin_iteration(&mut self) -> Task {
        let (x0, g0) = (self.state.x0(), self.state.g0());
        let reals = self.state.reals_mut();
        reals[x0].copy_from_slice(&self.iterate.x);
        reals[g0].copy_from_slice(&self.iterate.g);
        self.state.set_f0(self.iterate.f);
        self.state.set_iteration_evaluations(0);

        let steepest = self.state.columns() == 0;
        self.search_from_x0(steepest)
    }

    /// Computes the direction from `X0`/`G0` and moves `x` to the first trial.
    fn search_from_x0(&mut self, steepest: bool) -> Task {
        let mut steepest = steepest;
        if !steepest && !self.quasi_newton_direction() {
            memory::reset(&mut self.state);
            steepest = true;
        }
        if steepest && !self.steepest_direction() {
            return self.finish(Task::Abnormal(Abnormality::NoDescent));
        }
        self.state.set_steepest(steepest);
        self.state.set_backtracks(0);

        let d = self.state.d();
        let d_norm = self.state.dot(d.clone(), d).sqrt();
        self.state.set_d_norm(d_norm);

        let stp = if steepest { (1.0 / d_norm).min(1.0) } else { 1.0 };
        self.state.set_stp(stp);
        self.move_to_trial();

        if self.state.dg() >= 0.0 {
            // The projection turned the step away from descent.
            if steepest {
                self.restore_x0();
                return self.finish(Task::Abnormal(Abnormality::Stagnation));
            }
            memory::reset(&mut self.state);
            return self.search_from_x0(true);
        }

        self.state.set_phase(Phase::LineSearch);
        Task::NeedFunctionGradient
    }

    /// Sets `D` to the steepest descent direction, masked at the bounds.
    ///
    /// Returns `false` if no variable can move.
    fn steepest_direction(&mut self) -> bool {
        let (d, g0) = (self.state.d(), self.state.g0());
        let n = self.state.n();
        let mut any = false;
        for i in 0..n {
            let g = self.state.reals()[g0.start + i];
            let value = if is_held(self.state.status(i), g) { 0.0 } else { -g };
            any |= value != 0.0;
            self.state.reals_mut()[d.start + i] = value;
        }
        any
    }

    /// Sets `D` to the masked quasi-Newton direction.
    ///
    /// Returns `false` if it is not a descent direction.
    fn quasi_newton_direction(&mut self) -> bool {
        let (d, g0, q) = (self.state.d(), self.state.g0(), self.state.q());
        let n = self.state.n();

        for i in 0..n {
            let g = self.state.reals()[g0.start + i];
            let value = if is_held(self.state.status(i), g) { 0.0 } else { g };
            self.state.reals_mut()[q.start + i] = value;
        }
        memory::apply_inverse_hessian(&mut self.state);

        for i in 0..n {
            let g = self.state.reals()[g0.start + i];
            let value = if is_held(self.state.status(i), g) {
                0.0
            } else {
                -self.state.reals()[q.start + i]
            };
            self.state.reals_mut()[d.start + i] = value;
        }

        let dg = self.state.dot(d, g0);
        dg.is_finite() && dg < 0.0
    }

    /// Writes `x = P(X0 + stp·D)` and records `G0·(x − X0)`.
    fn move_to_trial(&mut self) {
        let stp = self.state.stp();
        let (x0, d, g0) = (self.state.x0(), self.state.d(), self.state.g0());
        let reals = self.state.reals();

        let mut dg = 0.0;
        let trial = self.iterate.x.iter_mut().zip(self.setup.bounds);
        for (i, (x, bound)) in trial.enumerate() {
            let start = reals[x0.start + i];
            *x = bound.project(start + stp * reals[d.start + i]);
            dg += reals[g0.start + i] * (*x - start);
        }
        self.state.set_dg(dg);
    }

    /// Puts `X0`, `F0` and `G0` back into the iterate.
    fn restore_x0(&mut self) {
        let (x0, g0) = (self.state.x0(), self.state.g0());
        let reals = self.state.reals();
        self.iterate.x.copy_from_slice(&reals[x0]);
        self.iterate.g.copy_from_slice(&reals[g0]);
        self.iterate.f = self.state.f0();
    }

    /// Handles the evaluation at a line-search trial point.
    fn after_trial(&mut self) -> Task {
        self.state.count_evaluation();

        let (f, f0, dg) = (self.iterate.f, self.state.f0(), self.state.dg());
        let finite = f.is_finite() && all_finite(&self.iterate.g);
        if finite && f < f0 && f <= f0 + ARMIJO * dg {
            return self.accept();
        }

        let backtracks = self.state.backtracks() + 1;
        self.state.set_backtracks(backtracks);
        if backtracks < MAX_BACKTRACKS {
            // Minimizer of the quadratic through f0, the slope dg, and f.
            let curvature = f - f0 - dg;
            let shrink = if finite && curvature > 0.0 {
                (-dg / (2.0 * curvature)).clamp(SHRINK_MIN, SHRINK_MAX)
            } else {
                SHRINK_MAX
            };
            self.state.set_stp(self.state.stp() * shrink);
            self.move_to_trial();

            let x0 = self.state.x0();
            if self.iterate.x[..] != self.state.reals()[x0] {
                return Task::NeedFunctionGradient;
            }
        }

        self.restore_x0();
        if self.state.steepest() {
            return self.finish(Task::Abnormal(Abnormality::LineSearch));
        }
        memory::reset(&mut self.state);
        self.search_from_x0(true)
    }

    /// Accepts the trial point as the next iterate.
    fn accept(&mut self) -> Task {
        memory::store_pair(&mut self.state, &self.iterate.x, &self.iterate.g);

        self.state.set_iteration(self.state.iteration() + 1);
        self.state.set_f_prev(self.state.f0());

        self.state.remember_status();
        self.refresh_status();
        self.refresh_pg_norm();

        let n = self.state.n();
        let (mut entered, mut left) = (0, 0);
        for i in 0..n {
            let was_active = self.state.previous_status(i).is_active();
            match (was_active, self.state.status(i).is_active()) {
                (false, true) => entered += 1,
                (true, false) => left += 1,
                _ => {}
            }
        }
        self.state.set_changes(entered, left);

        self.state.set_phase(Phase::NewIterate);
        self.report.iteration(
            &self.state.diagnostics(),
            self.iterate.f,
            self.state.stp() * self.state.d_norm(),
            self.state.changes(),
            &self.iterate.x,
            &self.iterate.g,
        );

        Task::NewIterate
    }

    /// Ends the run with `task`.
    fn finish(&mut self, task: Task) -> Task {
        self.state.set_phase(Phase::Done);
        self.report.finish(
            &task,
            &self.state.diagnostics(),
            self.iterate.f,
            &self.iterate.x,
        );
        task
    }

    /// Classifies every variable against its bound and counts the active ones.
    fn refresh_status(&mut self) {
        let mut active = 0;
        let points = self.setup.bounds.iter().zip(&self.iterate.x);
        for (i, (bound, &x)) in points.enumerate() {
            let status = classify(bound, x);
            if status.is_active() {
                active += 1;
            }
            self.state.set_status(i, status);
        }
        self.state.set_active_counts(self.state.n() - active, active);
    }

    fn refresh_pg_norm(&mut self) {
        let norm = projected_gradient_norm(self.setup.bounds, &self.iterate.x, &self.iterate.g);
        self.state.set_pg_norm(norm);
    }
}
