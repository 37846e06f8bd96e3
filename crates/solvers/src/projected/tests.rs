use std::fmt::Debug;

use approx::assert_relative_eq;
use rcopt_core::{Bound, Objective, problems::Quadratic, problems::Rosenbrock};

use crate::protocol::{
    Abnormality, Convergence, Diagnostics, InputError, Iterate, ReverseSolver, Setup, Task,
    Verbosity, Workspace,
};

use super::ProjectedLbfgs;

const CAP: usize = 20_000;

struct Outcome {
    task: Task,
    iterate: Iterate,
    diagnostics: Diagnostics,
    new_iterates: usize,
}

fn setup(bounds: &[Bound], factr: f64, pgtol: f64) -> Setup<'_> {
    Setup {
        corrections: 5,
        bounds,
        factr,
        pgtol,
        verbosity: Verbosity::SILENT,
    }
}

/// Runs the handshake to completion, panicking if it takes more than `CAP` evaluations.
fn drive<O>(
    solver: &mut ProjectedLbfgs,
    setup: &Setup<'_>,
    objective: &O,
    x0: Vec<f64>,
) -> Outcome
where
    O: Objective,
    O::Error: Debug,
{
    let mut workspace = Workspace::new(setup.dimension(), setup.corrections).unwrap();
    let mut iterate = Iterate::new(x0);
    let mut task = Task::Start;
    let mut diagnostics = Diagnostics::default();
    let mut evaluations = 0;
    let mut new_iterates = 0;

    loop {
        solver.step(setup, &mut iterate, &mut workspace, &mut task, &mut diagnostics);
        match task {
            Task::NeedFunctionGradient => {
                evaluations += 1;
                assert!(evaluations <= CAP, "evaluation cap reached");
                let eval = objective.evaluate(&iterate.x).unwrap();
                iterate.f = eval.value;
                iterate.g = eval.gradient;
            }
            Task::NewIterate => new_iterates += 1,
            _ => break,
        }
    }

    Outcome {
        task,
        iterate,
        diagnostics,
        new_iterates,
    }
}

#[test]
fn bounded_quadratic_lands_on_the_projected_center() {
    let objective = Quadratic::new(vec![2.0, -3.0, 0.5]);
    let bounds = [
        Bound::LowerAndUpper(0.0, 1.0),
        Bound::Lower(0.0),
        Bound::Unbounded,
    ];
    let setup = setup(&bounds, 1e7, 1e-5);

    let outcome = drive(&mut ProjectedLbfgs::new(), &setup, &objective, vec![0.5, 1.0, 5.0]);

    assert_eq!(
        outcome.task,
        Task::Converged(Convergence::ProjectedGradient)
    );
    assert_relative_eq!(outcome.iterate.x[0], 1.0);
    assert_relative_eq!(outcome.iterate.x[1], 0.0);
    assert_relative_eq!(outcome.iterate.x[2], 0.5, epsilon = 1e-10);
    assert_relative_eq!(outcome.iterate.f, 10.0, epsilon = 1e-10);

    let diagnostics = outcome.diagnostics;
    assert_eq!(diagnostics.active_constraints, 2);
    assert_eq!(diagnostics.free_variables, 1);
    assert!(diagnostics.has_bounds);
    assert!(!diagnostics.all_doubly_bounded);
    assert!(!diagnostics.initial_x_infeasible);
    assert_eq!(diagnostics.machine_epsilon, f64::EPSILON);
    assert!(diagnostics.projected_gradient_norm <= 1e-5);
}

#[test]
fn weighted_quadratic_converges_without_bounds() {
    let objective =
        Quadratic::new(vec![1.0, -2.0, 3.0, -4.0]).with_weights(vec![1.0, 10.0, 0.1, 5.0]);
    let bounds = [Bound::Unbounded; 4];
    let setup = setup(&bounds, 1e1, 1e-8);

    let outcome = drive(&mut ProjectedLbfgs::new(), &setup, &objective, vec![0.0; 4]);

    assert!(matches!(outcome.task, Task::Converged(_)));
    for (x, c) in outcome.iterate.x.iter().zip(objective.center()) {
        assert_relative_eq!(*x, *c, epsilon = 1e-6);
    }
    assert!(!outcome.diagnostics.has_bounds);
    assert_eq!(outcome.diagnostics.iteration, outcome.new_iterates);
}

#[test]
fn infeasible_start_is_projected_and_flagged() {
    let objective = Quadratic::new(vec![0.5, 0.5]);
    let bounds = [Bound::LowerAndUpper(0.0, 1.0), Bound::Upper(1.0)];
    let setup = setup(&bounds, 1e7, 1e-5);

    let mut solver = ProjectedLbfgs::new();
    let mut workspace = Workspace::new(2, 5).unwrap();
    let mut iterate = Iterate::new(vec![-4.0, 9.0]);
    let mut task = Task::Start;
    let mut diagnostics = Diagnostics::default();

    solver.step(&setup, &mut iterate, &mut workspace, &mut task, &mut diagnostics);

    assert_eq!(task, Task::NeedFunctionGradient);
    assert_eq!(iterate.x, vec![0.0, 1.0]);

    let outcome = drive(&mut solver, &setup, &objective, vec![-4.0, 9.0]);
    assert!(outcome.diagnostics.initial_x_infeasible);
    assert!(!outcome.diagnostics.all_doubly_bounded);
    assert_relative_eq!(outcome.iterate.x[0], 0.5, epsilon = 1e-8);
}

#[test]
fn fixed_variables_never_move() {
    let objective = Quadratic::new(vec![3.0, 3.0]);
    let bounds = [Bound::LowerAndUpper(2.0, 2.0), Bound::LowerAndUpper(-1.0, 5.0)];
    let setup = setup(&bounds, 1e7, 1e-5);

    let outcome = drive(&mut ProjectedLbfgs::new(), &setup, &objective, vec![2.0, 0.0]);

    assert!(matches!(outcome.task, Task::Converged(_)));
    assert_eq!(outcome.iterate.x[0], 2.0);
    assert_relative_eq!(outcome.iterate.x[1], 3.0, epsilon = 1e-8);
    assert!(outcome.diagnostics.all_doubly_bounded);
}

#[test]
fn disabled_tolerances_still_terminate() {
    let objective = Quadratic::new(vec![1.0, 2.0]);
    let bounds = [Bound::Lower(0.0), Bound::Upper(1.5)];
    let setup = setup(&bounds, 0.0, 0.0);

    let outcome = drive(&mut ProjectedLbfgs::new(), &setup, &objective, vec![4.0, -4.0]);

    assert!(
        matches!(outcome.task, Task::Abnormal(_)),
        "unexpected {:?}",
        outcome.task
    );
    assert_relative_eq!(outcome.iterate.x[0], 1.0, epsilon = 1e-8);
    assert_relative_eq!(outcome.iterate.x[1], 1.5);
}

#[test]
fn sample_rosenbrock_terminates_inside_the_bounds() {
    let sample = Rosenbrock::sample_problem(25);
    let bounds = sample.bounds.as_slice();
    let setup = setup(bounds, 1e7, 1e-5);

    let start = {
        let x0: Vec<f64> = bounds
            .iter()
            .zip(&sample.x0)
            .map(|(b, &x)| b.project(x))
            .collect();
        Rosenbrock.evaluate(&x0).unwrap().value
    };

    let outcome = drive(&mut ProjectedLbfgs::new(), &setup, &Rosenbrock, sample.x0.clone());

    assert!(!matches!(outcome.task, Task::Error(_)));
    assert!(outcome.iterate.f < start);
    for (bound, &x) in bounds.iter().zip(&outcome.iterate.x) {
        assert!(bound.contains(x));
    }
}

#[test]
fn start_rejects_bad_input() {
    let bounds = [Bound::Unbounded, Bound::LowerAndUpper(1.0, 0.0)];
    let cases: [(Setup<'_>, usize, InputError); 6] = [
        (setup(&[], 1e7, 1e-5), 2, InputError::EmptyProblem),
        (
            Setup {
                corrections: 0,
                ..setup(&bounds[..1], 1e7, 1e-5)
            },
            1,
            InputError::NoCorrections,
        ),
        (setup(&bounds[..1], -1.0, 1e-5), 1, InputError::NegativeFactr),
        (setup(&bounds[..1], 1e7, f64::NAN), 1, InputError::NegativePgtol),
        (setup(&bounds, 1e7, 1e-5), 2, InputError::InvalidBounds { index: 1 }),
        (setup(&bounds[..1], 1e7, 1e-5), 3, InputError::DimensionMismatch),
    ];

    for (setup, x_len, expected) in cases {
        let mut workspace = Workspace::new(3, 5).unwrap();
        let mut iterate = Iterate::new(vec![0.0; x_len]);
        let mut task = Task::Start;
        let mut diagnostics = Diagnostics::default();

        ProjectedLbfgs::new().step(&setup, &mut iterate, &mut workspace, &mut task, &mut diagnostics);

        assert_eq!(task, Task::Error(expected));
        assert_eq!(diagnostics, Diagnostics::default());
    }
}

#[test]
fn mismatched_workspace_is_rejected() {
    let bounds = [Bound::Unbounded; 2];
    let setup = setup(&bounds, 1e7, 1e-5);
    let mut workspace = Workspace::new(2, 4).unwrap();
    let mut iterate = Iterate::new(vec![0.0; 2]);
    let mut task = Task::Start;
    let mut diagnostics = Diagnostics::default();

    ProjectedLbfgs::new().step(&setup, &mut iterate, &mut workspace, &mut task, &mut diagnostics);

    assert_eq!(task, Task::Error(InputError::Workspace));
}

#[test]
fn evaluation_without_a_run_is_rejected() {
    let bounds = [Bound::Unbounded];
    let setup = setup(&bounds, 1e7, 1e-5);
    let mut workspace = Workspace::new(1, 5).unwrap();
    let mut iterate = Iterate::new(vec![0.0]);
    let mut task = Task::NeedFunctionGradient;
    let mut diagnostics = Diagnostics::default();

    ProjectedLbfgs::new().step(&setup, &mut iterate, &mut workspace, &mut task, &mut diagnostics);

    assert_eq!(task, Task::Error(InputError::Workspace));
}

#[test]
fn non_finite_start_is_abnormal() {
    let bounds = [Bound::Unbounded];
    let setup = setup(&bounds, 1e7, 1e-5);
    let mut workspace = Workspace::new(1, 5).unwrap();
    let mut iterate = Iterate::new(vec![0.0]);
    let mut task = Task::Start;
    let mut diagnostics = Diagnostics::default();
    let mut solver = ProjectedLbfgs::new();

    solver.step(&setup, &mut iterate, &mut workspace, &mut task, &mut diagnostics);
    iterate.f = f64::NAN;
    solver.step(&setup, &mut iterate, &mut workspace, &mut task, &mut diagnostics);

    assert_eq!(task, Task::Abnormal(Abnormality::NonFiniteStart));
    assert_eq!(diagnostics.evaluations, 1);
}

#[test]
fn stop_is_acknowledged_after_a_new_iterate() {
    let objective = Quadratic::new(vec![10.0, -10.0]);
    let bounds = [Bound::Unbounded; 2];
    let setup = setup(&bounds, 0.0, 0.0);
    let mut workspace = Workspace::new(2, 5).unwrap();
    let mut iterate = Iterate::new(vec![0.0, 0.0]);
    let mut task = Task::Start;
    let mut diagnostics = Diagnostics::default();
    let mut solver = ProjectedLbfgs::new();

    while task != Task::NewIterate {
        solver.step(&setup, &mut iterate, &mut workspace, &mut task, &mut diagnostics);
        if task == Task::NeedFunctionGradient {
            let eval = objective.evaluate(&iterate.x).unwrap();
            iterate.f = eval.value;
            iterate.g = eval.gradient;
        }
    }
    let x = iterate.x.clone();

    task = Task::Stop;
    solver.step(&setup, &mut iterate, &mut workspace, &mut task, &mut diagnostics);
    assert_eq!(task, Task::Stop);
    assert_eq!(iterate.x, x);
    assert_eq!(diagnostics.iteration, 1);

    // A second step after the acknowledgement changes nothing.
    solver.step(&setup, &mut iterate, &mut workspace, &mut task, &mut diagnostics);
    assert_eq!(task, Task::Stop);
}

#[test]
fn summary_file_follows_the_run() {
    let path = std::env::temp_dir().join(format!("rcopt-summary-{}.dat", std::process::id()));
    let objective = Quadratic::new(vec![1.0, 1.0]);
    let bounds = [Bound::Unbounded; 2];
    let mut setup = setup(&bounds, 1e7, 1e-5);
    setup.verbosity = Verbosity::every(1);

    let mut solver = ProjectedLbfgs::with_summary(&path);
    assert_eq!(solver.summary_path(), Some(path.as_path()));
    let outcome = drive(&mut solver, &setup, &objective, vec![0.0, 0.0]);

    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(text.starts_with("projected L-BFGS summary"));
    assert!(text.contains("N = 2    M = 5"));
    assert!(text.contains(&outcome.task.message()));
}

#[test]
fn silent_runs_leave_no_summary_file() {
    let path = std::env::temp_dir().join(format!("rcopt-silent-{}.dat", std::process::id()));
    let objective = Quadratic::new(vec![1.0]);
    let bounds = [Bound::Unbounded];
    let setup = setup(&bounds, 1e7, 1e-5);

    drive(&mut ProjectedLbfgs::with_summary(&path), &setup, &objective, vec![0.0]);

    assert!(!path.exists());
}
