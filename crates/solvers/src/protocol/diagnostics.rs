/// Read-only progress information written by the solver.
///
/// The solver refreshes this snapshot every time it returns
/// [`Task::NewIterate`](super::Task::NewIterate), and again when the run ends.
/// The caller uses it for reporting and never writes to it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Diagnostics {
    /// Completed iterations.
    pub iteration: usize,

    /// Total objective/gradient evaluations so far.
    pub evaluations: usize,

    /// Evaluations spent in the most recent iteration.
    pub iteration_evaluations: usize,

    /// Variables not held at a bound.
    pub free_variables: usize,

    /// Variables held at a bound.
    pub active_constraints: usize,

    /// Objective value at the previous iterate.
    pub previous_value: f64,

    /// Machine precision used in the relative-reduction test.
    pub machine_epsilon: f64,

    /// Infinity norm of the projected gradient at the current iterate.
    pub projected_gradient_norm: f64,

    /// The starting point violated the bounds and was projected.
    pub initial_x_infeasible: bool,

    /// At least one variable carries a bound.
    pub has_bounds: bool,

    /// Every variable carries both bounds.
    pub all_doubly_bounded: bool,
}
