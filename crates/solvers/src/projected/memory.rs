//! Limited-memory correction pairs stored in a circular buffer.

use std::ops::Range;

use super::state::State;

/// Slot holding the `k`-th stored pair, oldest first.
fn slot(state: &State<'_>, k: usize) -> usize {
    (state.head() + k) % state.m()
}

/// Adds `a · reals[from]` to `reals[to]`.
fn axpy(reals: &mut [f64], a: f64, from: Range<usize>, to: Range<usize>) {
    for (i, j) in from.zip(to) {
        reals[j] += a * reals[i];
    }
}

/// Replaces `Q` with `H·Q` using the two-loop recursion.
///
/// `H` is the inverse Hessian approximation built from the stored pairs,
/// seeded with `γ·I` where `γ = sᵀy / yᵀy` of the newest pair. With no
/// stored pairs `Q` is left as is.
pub(super) fn apply_inverse_hessian(state: &mut State<'_>) {
    let columns = state.columns();
    if columns == 0 {
        return;
    }
    let q = state.q();

    for k in (0..columns).rev() {
        let j = slot(state, k);
        let alpha = state.reals()[state.rho(j)] * state.dot(state.s(j), q.clone());
        let (alpha_index, y) = (state.alpha(j), state.y(j));
        let reals = state.reals_mut();
        reals[alpha_index] = alpha;
        axpy(reals, -alpha, y, q.clone());
    }

    let newest = slot(state, columns - 1);
    let (s, y) = (state.s(newest), state.y(newest));
    let gamma = state.dot(s, y.clone()) / state.dot(y.clone(), y);
    for value in &mut state.reals_mut()[q.clone()] {
        *value *= gamma;
    }

    for k in 0..columns {
        let j = slot(state, k);
        let beta = state.reals()[state.rho(j)] * state.dot(state.y(j), q.clone());
        let alpha = state.reals()[state.alpha(j)];
        let s = state.s(j);
        axpy(state.reals_mut(), alpha - beta, s, q.clone());
    }
}

/// Stores `s = x − X0` and `y = g − G0` if the pair keeps `H` positive definite.
///
/// A pair is kept only when `sᵀy > ε·yᵀy`. Once `m` pairs are stored the
/// oldest is overwritten. Returns `true` if the pair was kept.
pub(super) fn store_pair(state: &mut State<'_>, x: &[f64], g: &[f64]) -> bool {
    let (x0, g0) = (state.x0(), state.g0());
    let (mut sy, mut yy) = (0.0, 0.0);
    for ((xi, gi), (x0i, g0i)) in x.iter().zip(g).zip(x0.zip(g0)) {
        let reals = state.reals();
        let s = xi - reals[x0i];
        let y = gi - reals[g0i];
        sy += s * y;
        yy += y * y;
    }

    if !sy.is_finite() || sy <= state.epsmch() * yy {
        return false;
    }

    let (m, columns, head) = (state.m(), state.columns(), state.head());
    let target = if columns < m {
        state.set_columns(columns + 1);
        (head + columns) % m
    } else {
        state.set_head((head + 1) % m);
        head
    };

    let (s, y, x0, g0, rho) = (
        state.s(target),
        state.y(target),
        state.x0(),
        state.g0(),
        state.rho(target),
    );
    let reals = state.reals_mut();
    for (i, (si, x0i)) in s.zip(x0).enumerate() {
        reals[si] = x[i] - reals[x0i];
    }
    for (i, (yi, g0i)) in y.zip(g0).enumerate() {
        reals[yi] = g[i] - reals[g0i];
    }
    reals[rho] = 1.0 / sy;

    true
}

/// Forgets every stored pair.
pub(super) fn reset(state: &mut State<'_>) {
    state.set_head(0);
    state.set_columns(0);
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::protocol::Workspace;

    use super::*;

    fn load(state: &mut State<'_>, x0: &[f64], g0: &[f64]) {
        let (x0_range, g0_range) = (state.x0(), state.g0());
        let reals = state.reals_mut();
        reals[x0_range].copy_from_slice(x0);
        reals[g0_range].copy_from_slice(g0);
    }

    #[test]
    fn one_pair_recovers_a_diagonal_curvature() {
        // f = x₀² + x₁², so y = 2s and H·g should equal g / 2.
        let mut workspace = Workspace::new(2, 3).unwrap();
        let mut state = State::new(2, 3, workspace.solver_view());
        state.set_epsmch(f64::EPSILON);

        load(&mut state, &[1.0, 1.0], &[2.0, 2.0]);
        assert!(store_pair(&mut state, &[0.5, 0.25], &[1.0, 0.5]));
        assert_eq!(state.columns(), 1);

        let q = state.q();
        state.reals_mut()[q.clone()].copy_from_slice(&[4.0, -2.0]);
        apply_inverse_hessian(&mut state);

        assert_relative_eq!(state.reals()[q.start], 2.0, epsilon = 1e-12);
        assert_relative_eq!(state.reals()[q.start + 1], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn negative_curvature_pairs_are_skipped() {
        let mut workspace = Workspace::new(1, 2).unwrap();
        let mut state = State::new(1, 2, workspace.solver_view());
        state.set_epsmch(f64::EPSILON);

        load(&mut state, &[0.0], &[1.0]);
        assert!(!store_pair(&mut state, &[1.0], &[0.0]));
        assert_eq!(state.columns(), 0);
    }

    #[test]
    fn oldest_pair_is_overwritten_when_full() {
        let mut workspace = Workspace::new(1, 2).unwrap();
        let mut state = State::new(1, 2, workspace.solver_view());
        state.set_epsmch(f64::EPSILON);

        for step in 1..=3 {
            let step = f64::from(step);
            load(&mut state, &[0.0], &[0.0]);
            assert!(store_pair(&mut state, &[step], &[step]));
        }

        assert_eq!(state.columns(), 2);
        assert_eq!(state.head(), 1);
        // Slot 0 was reused for the third pair.
        assert_eq!(state.reals()[state.s(0).start], 3.0);

        reset(&mut state);
        assert_eq!(state.columns(), 0);
    }
}
