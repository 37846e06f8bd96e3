use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
};

use crate::protocol::{Diagnostics, Task, Verbosity};

/// Renders progress at the requested verbosity through the `log` facade.
///
/// Final and progress lines go to `info`, per-iteration detail to `debug`,
/// and vectors to `trace`. When a summary path is set and the verbosity is
/// positive, the same progress is also written to that file.
pub(super) struct Report<'a> {
    verbosity: Verbosity,
    summary: Option<&'a Path>,
}

impl<'a> Report<'a> {
    pub(super) fn new(verbosity: Verbosity, summary: Option<&'a Path>) -> Self {
        Self { verbosity, summary }
    }

    pub(super) fn start(&self, n: usize, m: usize, infeasible: bool, at_bounds: usize) {
        if !self.verbosity.is_silent() {
            log::info!("projected L-BFGS: n = {n}, m = {m}");
            if infeasible {
                log::info!("initial x violated the bounds and was projected");
            }
            log::info!("{at_bounds} variables are exactly at the bounds at x0");
        }

        self.write_summary(true, |out| {
            writeln!(out, "projected L-BFGS summary")?;
            writeln!(out, "N = {n}    M = {m}")?;
            writeln!(out)?;
            writeln!(
                out,
                "{:>6} {:>6} {:>6} {:>12} {:>16}",
                "it", "nf", "nact", "|proj g|", "f"
            )
        });
    }

    pub(super) fn iteration(
        &self,
        diagnostics: &Diagnostics,
        f: f64,
        step: f64,
        changes: (usize, usize),
        x: &[f64],
        g: &[f64],
    ) {
        let iteration = diagnostics.iteration;
        let pg_norm = diagnostics.projected_gradient_norm;

        if self.verbosity.reports_iteration(iteration) {
            log::info!("iteration {iteration}: f = {f:.8e}, |proj g| = {pg_norm:.3e}");
        }
        if self.verbosity.reports_details() {
            log::debug!(
                "iteration {iteration}: {} evaluations ({} this iteration), {} free, {} active, step = {step:.3e}",
                diagnostics.evaluations,
                diagnostics.iteration_evaluations,
                diagnostics.free_variables,
                diagnostics.active_constraints,
            );
        }
        let (entered, left) = changes;
        if self.verbosity.reports_active_set() && entered + left > 0 {
            log::debug!("{entered} variables entered and {left} left the active set");
        }
        if self.verbosity.reports_vectors() {
            log::trace!("x = {x:?}");
            log::trace!("g = {g:?}");
        }

        self.write_summary(false, |out| {
            writeln!(
                out,
                "{iteration:>6} {:>6} {:>6} {pg_norm:>12.3e} {f:>16.8e}",
                diagnostics.evaluations, diagnostics.active_constraints,
            )
        });
    }

    pub(super) fn finish(&self, task: &Task, diagnostics: &Diagnostics, f: f64, x: &[f64]) {
        if !self.verbosity.is_silent() {
            log::info!(
                "{task} after {} iterations and {} evaluations, f = {f:.8e}, |proj g| = {:.3e}",
                diagnostics.iteration,
                diagnostics.evaluations,
                diagnostics.projected_gradient_norm,
            );
        }
        if self.verbosity.reports_active_set() {
            log::info!("final x = {x:?}");
        }

        self.write_summary(false, |out| {
            writeln!(out)?;
            writeln!(out, "{task}")?;
            writeln!(out, "iterations  = {}", diagnostics.iteration)?;
            writeln!(out, "evaluations = {}", diagnostics.evaluations)?;
            writeln!(out, "f           = {f:.8e}")?;
            writeln!(
                out,
                "|proj g|    = {:.3e}",
                diagnostics.projected_gradient_norm
            )
        });
    }

    /// Creates (`truncate`) or appends to the summary file.
    ///
    /// Failures are logged and otherwise ignored.
    fn write_summary<F>(&self, truncate: bool, body: F)
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let Some(path) = self.summary else {
            return;
        };
        if !self.verbosity.writes_summary() {
            return;
        }

        let result = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(truncate)
            .append(!truncate)
            .open(path)
            .and_then(|mut file| body(&mut file));

        if let Err(error) = result {
            log::warn!("could not write summary file {}: {error}", path.display());
        }
    }
}
