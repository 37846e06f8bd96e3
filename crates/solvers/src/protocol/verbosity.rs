#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Output level forwarded unchanged to the solver.
///
/// | Level     | Output                                                    |
/// |-----------|-----------------------------------------------------------|
/// | `< 0`     | nothing                                                   |
/// | `0`       | one line when the run ends                                |
/// | `1..=98`  | also `f` and the projected-gradient norm every `level` iterations |
/// | `99`      | details of every iteration except n-vectors               |
/// | `100`     | also changes of the active set and the final `x`          |
/// | `> 100`   | details of every iteration including `x` and `g`          |
///
/// Any positive level also enables the solver's per-run summary file, if the
/// solver has one configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Verbosity(i32);

impl Verbosity {
    /// No output.
    pub const SILENT: Self = Self(-1);

    /// Final summary only.
    pub const SUMMARY: Self = Self(0);

    /// Every iteration, without vectors.
    pub const DETAIL: Self = Self(99);

    /// Every iteration, with active-set changes and the final point.
    pub const ACTIVE_SET: Self = Self(100);

    /// Every iteration, with `x` and `g`.
    pub const VECTORS: Self = Self(101);

    /// Creates a verbosity from its raw level.
    #[must_use]
    pub const fn new(level: i32) -> Self {
        Self(level)
    }

    /// Progress lines every `k` iterations (clamped to `1..=98`).
    #[must_use]
    pub fn every(k: u8) -> Self {
        Self(i32::from(k.clamp(1, 98)))
    }

    /// Returns the raw level.
    #[must_use]
    pub const fn level(self) -> i32 {
        self.0
    }

    /// Returns `true` if the solver should print anything at all.
    #[must_use]
    pub fn is_silent(self) -> bool {
        self.0 < 0
    }

    /// Returns `true` if a progress line is due for `iteration`.
    #[must_use]
    pub fn reports_iteration(self, iteration: usize) -> bool {
        match self.0 {
            ..=0 => false,
            1..=98 => iteration % self.0.unsigned_abs() as usize == 0,
            _ => true,
        }
    }

    /// Returns `true` for per-iteration detail.
    #[must_use]
    pub fn reports_details(self) -> bool {
        self.0 >= 99
    }

    /// Returns `true` if active-set changes and the final point are reported.
    #[must_use]
    pub fn reports_active_set(self) -> bool {
        self.0 >= 100
    }

    /// Returns `true` if `x` and `g` are reported every iteration.
    #[must_use]
    pub fn reports_vectors(self) -> bool {
        self.0 > 100
    }

    /// Returns `true` if the solver should write its per-run summary file.
    #[must_use]
    pub fn writes_summary(self) -> bool {
        self.0 > 0
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::SILENT
    }
}
