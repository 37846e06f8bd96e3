use std::ops::Range;

use crate::protocol::{Diagnostics, WorkspaceMut};

/// Where the solver is between handshake rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Phase {
    /// No run in progress.
    Idle,

    /// Waiting for `f` and `g` at the starting point.
    InitialEval,

    /// Waiting for `f` and `g` at a line-search trial point.
    LineSearch,

    /// Reported a new iterate; waiting for the caller to continue or stop.
    NewIterate,

    /// The run has ended.
    Done,
}

impl Phase {
    fn code(self) -> i64 {
        match self {
            Self::Idle => 0,
            Self::InitialEval => 1,
            Self::LineSearch => 2,
            Self::NewIterate => 3,
            Self::Done => 4,
        }
    }

    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Idle),
            1 => Some(Self::InitialEval),
            2 => Some(Self::LineSearch),
            3 => Some(Self::NewIterate),
            4 => Some(Self::Done),
            _ => None,
        }
    }
}

/// Slots in the integer save area.
///
/// Counters use the slots L-BFGS-B documents for its `isave` (0-based here).
mod isave {
    pub const PHASE: usize = 0;
    pub const HEAD: usize = 1;
    pub const COLUMNS: usize = 2;
    pub const BACKTRACKS: usize = 3;
    pub const ENTERED: usize = 4;
    pub const LEFT: usize = 5;
    pub const STEEPEST: usize = 6;
    pub const ITERATION: usize = 29;
    pub const EVALUATIONS: usize = 33;
    pub const ITERATION_EVALUATIONS: usize = 35;
    pub const FREE: usize = 37;
    pub const ACTIVE: usize = 38;
}

/// Slots in the real save area.
mod dsave {
    pub const F0: usize = 0;
    pub const F_PREV: usize = 1;
    pub const STP: usize = 2;
    pub const DG: usize = 3;
    pub const EPSMCH: usize = 4;
    pub const D_NORM: usize = 5;
    pub const PG_NORM: usize = 12;
}

/// Slots in the flag save area.
mod lsave {
    pub const INITIAL_INFEASIBLE: usize = 0;
    pub const HAS_BOUNDS: usize = 1;
    pub const ALL_DOUBLY_BOUNDED: usize = 2;
}

/// Where a variable sits relative to its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum VarStatus {
    Free,
    AtLower,
    AtUpper,
    Fixed,
}

impl VarStatus {
    fn code(self) -> i64 {
        match self {
            Self::Free => 0,
            Self::AtLower => -1,
            Self::AtUpper => 1,
            Self::Fixed => 2,
        }
    }

    fn from_code(code: i64) -> Self {
        match code {
            -1 => Self::AtLower,
            1 => Self::AtUpper,
            2 => Self::Fixed,
            _ => Self::Free,
        }
    }

    pub(super) fn is_active(self) -> bool {
        self != Self::Free
    }
}

/// Named views into a workspace sized for `n` variables and `m` corrections.
///
/// Real buffer: `S` (m·n), `Y` (m·n), then the n-vectors `X0`, `G0`, `D`,
/// `Q`, followed by `RHO` (m) and `ALPHA` (m). Integer buffer: the current
/// and previous variable status, n each. Whatever is left over in either
/// buffer is not used by this solver.
pub(super) struct State<'a> {
    n: usize,
    m: usize,
    ws: WorkspaceMut<'a>,
}

impl<'a> State<'a> {
    pub(super) fn new(n: usize, m: usize, ws: WorkspaceMut<'a>) -> Self {
        Self { n, m, ws }
    }

    pub(super) fn n(&self) -> usize {
        self.n
    }

    pub(super) fn m(&self) -> usize {
        self.m
    }

    // --- real buffer ---

    fn vector(&self, block: usize) -> Range<usize> {
        let start = 2 * self.m * self.n + block * self.n;
        start..start + self.n
    }

    fn tail(&self) -> usize {
        (2 * self.m + 5) * self.n
    }

    pub(super) fn s(&self, slot: usize) -> Range<usize> {
        let start = slot * self.n;
        start..start + self.n
    }

    pub(super) fn y(&self, slot: usize) -> Range<usize> {
        let start = (self.m + slot) * self.n;
        start..start + self.n
    }

    pub(super) fn x0(&self) -> Range<usize> {
        self.vector(0)
    }

    pub(super) fn g0(&self) -> Range<usize> {
        self.vector(1)
    }

    pub(super) fn d(&self) -> Range<usize> {
        self.vector(2)
    }

    pub(super) fn q(&self) -> Range<usize> {
        self.vector(3)
    }

    pub(super) fn rho(&self, slot: usize) -> usize {
        self.tail() + slot
    }

    pub(super) fn alpha(&self, slot: usize) -> usize {
        self.tail() + self.m + slot
    }

    pub(super) fn reals(&self) -> &[f64] {
        &*self.ws.reals
    }

    pub(super) fn reals_mut(&mut self) -> &mut [f64] {
        &mut *self.ws.reals
    }

    /// Returns `a · b` for two n-vectors in the real buffer.
    pub(super) fn dot(&self, a: Range<usize>, b: Range<usize>) -> f64 {
        dot(&self.ws.reals[a], &self.ws.reals[b])
    }

    // --- integer buffer ---

    pub(super) fn status(&self, i: usize) -> VarStatus {
        VarStatus::from_code(self.ws.integers[i])
    }

    pub(super) fn set_status(&mut self, i: usize, status: VarStatus) {
        self.ws.integers[i] = status.code();
    }

    pub(super) fn previous_status(&self, i: usize) -> VarStatus {
        VarStatus::from_code(self.ws.integers[self.n + i])
    }

    /// Copies the current status of every variable into the previous one.
    pub(super) fn remember_status(&mut self) {
        let n = self.n;
        self.ws.integers.copy_within(0..n, n);
    }

    // --- save areas ---

    pub(super) fn clear_saved(&mut self) {
        self.ws.isave.fill(0);
        self.ws.dsave.fill(0.0);
        self.ws.lsave.fill(false);
    }

    /// Returns `None` if the phase slot holds something this solver never writes.
    pub(super) fn phase(&self) -> Option<Phase> {
        Phase::from_code(self.ws.isave[isave::PHASE])
    }

    pub(super) fn set_phase(&mut self, phase: Phase) {
        self.ws.isave[isave::PHASE] = phase.code();
    }

    fn count(&self, slot: usize) -> usize {
        usize::try_from(self.ws.isave[slot]).unwrap_or(0)
    }

    fn set_count(&mut self, slot: usize, value: usize) {
        self.ws.isave[slot] = i64::try_from(value).unwrap_or(i64::MAX);
    }

    pub(super) fn iteration(&self) -> usize {
        self.count(isave::ITERATION)
    }

    pub(super) fn set_iteration(&mut self, value: usize) {
        self.set_count(isave::ITERATION, value);
    }

    pub(super) fn evaluations(&self) -> usize {
        self.count(isave::EVALUATIONS)
    }

    pub(super) fn iteration_evaluations(&self) -> usize {
        self.count(isave::ITERATION_EVALUATIONS)
    }

    pub(super) fn set_iteration_evaluations(&mut self, value: usize) {
        self.set_count(isave::ITERATION_EVALUATIONS, value);
    }

    /// Counts one objective evaluation.
    pub(super) fn count_evaluation(&mut self) {
        self.set_count(isave::EVALUATIONS, self.evaluations() + 1);
        self.set_iteration_evaluations(self.iteration_evaluations() + 1);
    }

    /// Slot of the oldest stored correction pair.
    pub(super) fn head(&self) -> usize {
        self.count(isave::HEAD)
    }

    pub(super) fn set_head(&mut self, value: usize) {
        self.set_count(isave::HEAD, value);
    }

    /// Number of stored correction pairs.
    pub(super) fn columns(&self) -> usize {
        self.count(isave::COLUMNS)
    }

    pub(super) fn set_columns(&mut self, value: usize) {
        self.set_count(isave::COLUMNS, value);
    }

    pub(super) fn backtracks(&self) -> usize {
        self.count(isave::BACKTRACKS)
    }

    pub(super) fn set_backtracks(&mut self, value: usize) {
        self.set_count(isave::BACKTRACKS, value);
    }

    pub(super) fn set_active_counts(&mut self, free: usize, active: usize) {
        self.set_count(isave::FREE, free);
        self.set_count(isave::ACTIVE, active);
    }

    pub(super) fn set_changes(&mut self, entered: usize, left: usize) {
        self.set_count(isave::ENTERED, entered);
        self.set_count(isave::LEFT, left);
    }

    pub(super) fn changes(&self) -> (usize, usize) {
        (self.count(isave::ENTERED), self.count(isave::LEFT))
    }

    pub(super) fn steepest(&self) -> bool {
        self.ws.isave[isave::STEEPEST] != 0
    }

    pub(super) fn set_steepest(&mut self, steepest: bool) {
        self.ws.isave[isave::STEEPEST] = i64::from(steepest);
    }

    pub(super) fn f0(&self) -> f64 {
        self.ws.dsave[dsave::F0]
    }

    pub(super) fn set_f0(&mut self, value: f64) {
        self.ws.dsave[dsave::F0] = value;
    }

    pub(super) fn f_prev(&self) -> f64 {
        self.ws.dsave[dsave::F_PREV]
    }

    pub(super) fn set_f_prev(&mut self, value: f64) {
        self.ws.dsave[dsave::F_PREV] = value;
    }

    pub(super) fn epsmch(&self) -> f64 {
        self.ws.dsave[dsave::EPSMCH]
    }

    pub(super) fn set_epsmch(&mut self, value: f64) {
        self.ws.dsave[dsave::EPSMCH] = value;
    }

    pub(super) fn pg_norm(&self) -> f64 {
        self.ws.dsave[dsave::PG_NORM]
    }

    pub(super) fn set_pg_norm(&mut self, value: f64) {
        self.ws.dsave[dsave::PG_NORM] = value;
    }

    pub(super) fn stp(&self) -> f64 {
        self.ws.dsave[dsave::STP]
    }

    pub(super) fn set_stp(&mut self, value: f64) {
        self.ws.dsave[dsave::STP] = value;
    }

    pub(super) fn dg(&self) -> f64 {
        self.ws.dsave[dsave::DG]
    }

    pub(super) fn set_dg(&mut self, value: f64) {
        self.ws.dsave[dsave::DG] = value;
    }

    pub(super) fn d_norm(&self) -> f64 {
        self.ws.dsave[dsave::D_NORM]
    }

    pub(super) fn set_d_norm(&mut self, value: f64) {
        self.ws.dsave[dsave::D_NORM] = value;
    }

    pub(super) fn set_flags(&mut self, initial_infeasible: bool, has_bounds: bool, all_doubly: bool) {
        self.ws.lsave[lsave::INITIAL_INFEASIBLE] = initial_infeasible;
        self.ws.lsave[lsave::HAS_BOUNDS] = has_bounds;
        self.ws.lsave[lsave::ALL_DOUBLY_BOUNDED] = all_doubly;
    }

    /// Writes the diagnostic snapshot from the saved scalars.
    pub(super) fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            iteration: self.iteration(),
            evaluations: self.evaluations(),
            iteration_evaluations: self.iteration_evaluations(),
            free_variables: self.count(isave::FREE),
            active_constraints: self.count(isave::ACTIVE),
            previous_value: self.f_prev(),
            machine_epsilon: self.epsmch(),
            projected_gradient_norm: self.pg_norm(),
            initial_x_infeasible: self.ws.lsave[lsave::INITIAL_INFEASIBLE],
            has_bounds: self.ws.lsave[lsave::HAS_BOUNDS],
            all_doubly_bounded: self.ws.lsave[lsave::ALL_DOUBLY_BOUNDED],
        }
    }
}

pub(super) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(a, b)| a * b).sum()
}
