use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of simple bound imposed on a single variable.
///
/// The integer codes returned by [`BoundType::code`] are the conventional
/// `nbd` encoding used by limited-memory bound-constrained solvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoundType {
    /// No bound on either side.
    Unbounded,

    /// Bounded below only.
    LowerOnly,

    /// Bounded on both sides.
    LowerAndUpper,

    /// Bounded above only.
    UpperOnly,
}

impl BoundType {
    /// Returns the integer code for this bound type (0, 1, 2 or 3).
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Unbounded => 0,
            Self::LowerOnly => 1,
            Self::LowerAndUpper => 2,
            Self::UpperOnly => 3,
        }
    }
}

impl TryFrom<i32> for BoundType {
    type Error = BoundsError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Unbounded),
            1 => Ok(Self::LowerOnly),
            2 => Ok(Self::LowerAndUpper),
            3 => Ok(Self::UpperOnly),
            _ => Err(BoundsError::UnknownCode(code)),
        }
    }
}

/// A simple bound on a single variable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Bound {
    /// The variable is free.
    Unbounded,

    /// `lower <= x`.
    Lower(f64),

    /// `lower <= x <= upper`.
    LowerAndUpper(f64, f64),

    /// `x <= upper`.
    Upper(f64),
}

impl Bound {
    /// Returns the kind of this bound.
    #[must_use]
    pub fn kind(&self) -> BoundType {
        match self {
            Self::Unbounded => BoundType::Unbounded,
            Self::Lower(_) => BoundType::LowerOnly,
            Self::LowerAndUpper(..) => BoundType::LowerAndUpper,
            Self::Upper(_) => BoundType::UpperOnly,
        }
    }

    /// Returns the lower bound, if any.
    #[must_use]
    pub fn lower(&self) -> Option<f64> {
        match *self {
            Self::Lower(l) | Self::LowerAndUpper(l, _) => Some(l),
            Self::Unbounded | Self::Upper(_) => None,
        }
    }

    /// Returns the upper bound, if any.
    #[must_use]
    pub fn upper(&self) -> Option<f64> {
        match *self {
            Self::Upper(u) | Self::LowerAndUpper(_, u) => Some(u),
            Self::Unbounded | Self::Lower(_) => None,
        }
    }

    /// Returns `true` if `lower <= upper` (or the bound has fewer than two sides).
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match *self {
            Self::LowerAndUpper(l, u) => l <= u,
            _ => true,
        }
    }

    /// Projects `x` onto the feasible interval.
    ///
    /// Sides the bound does not carry are never applied, so an
    /// [`Bound::Unbounded`] variable is returned unchanged.
    #[must_use]
    pub fn project(&self, x: f64) -> f64 {
        let x = self.lower().map_or(x, |l| x.max(l));
        self.upper().map_or(x, |u| x.min(u))
    }

    /// Returns `true` if `x` satisfies this bound.
    #[must_use]
    pub fn contains(&self, x: f64) -> bool {
        self.lower().is_none_or(|l| x >= l) && self.upper().is_none_or(|u| x <= u)
    }
}

/// Errors that can occur when building bounds.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum BoundsError {
    #[error("bound arrays have mismatched lengths (types: {types}, lower: {lower}, upper: {upper})")]
    LengthMismatch {
        types: usize,
        lower: usize,
        upper: usize,
    },

    #[error("variable {index} has lower bound {lower} above upper bound {upper}")]
    Inverted { index: usize, lower: f64, upper: f64 },

    #[error("unknown bound type code {0}")]
    UnknownCode(i32),
}

/// Per-variable simple bounds for a problem.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds(pub(crate) Vec<Bound>);

impl Bounds {
    /// Creates bounds from one [`Bound`] per variable.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::Inverted`] if any doubly bounded variable has
    /// `lower > upper`.
    pub fn new(bounds: Vec<Bound>) -> Result<Self, BoundsError> {
        let bounds = Self(bounds);
        bounds.validate()?;
        Ok(bounds)
    }

    /// Creates `n` unbounded variables.
    #[must_use]
    pub fn unbounded(n: usize) -> Self {
        Self(vec![Bound::Unbounded; n])
    }

    /// Creates bounds from the parallel-array form.
    ///
    /// Entries of `lower`/`upper` on a side the type omits are ignored and may
    /// hold any value.
    ///
    /// # Errors
    ///
    /// Returns an error if the arrays differ in length or a doubly bounded
    /// variable has `lower > upper`.
    pub fn from_arrays(
        types: &[BoundType],
        lower: &[f64],
        upper: &[f64],
    ) -> Result<Self, BoundsError> {
        if types.len() != lower.len() || types.len() != upper.len() {
            return Err(BoundsError::LengthMismatch {
                types: types.len(),
                lower: lower.len(),
                upper: upper.len(),
            });
        }

        let bounds = types
            .iter()
            .zip(lower.iter().zip(upper))
            .map(|(kind, (&l, &u))| match kind {
                BoundType::Unbounded => Bound::Unbounded,
                BoundType::LowerOnly => Bound::Lower(l),
                BoundType::LowerAndUpper => Bound::LowerAndUpper(l, u),
                BoundType::UpperOnly => Bound::Upper(u),
            })
            .collect();

        Self::new(bounds)
    }

    /// Checks that every doubly bounded variable has `lower <= upper`.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::Inverted`] for the first offending variable.
    pub fn validate(&self) -> Result<(), BoundsError> {
        match self.0.iter().position(|b| !b.is_consistent()) {
            Some(index) => {
                let bound = self.0[index];
                Err(BoundsError::Inverted {
                    index,
                    lower: bound.lower().unwrap_or(f64::NEG_INFINITY),
                    upper: bound.upper().unwrap_or(f64::INFINITY),
                })
            }
            None => Ok(()),
        }
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the per-variable bounds.
    #[must_use]
    pub fn as_slice(&self) -> &[Bound] {
        &self.0
    }

    /// Returns the bound type of every variable.
    #[must_use]
    pub fn types(&self) -> Vec<BoundType> {
        self.0.iter().map(Bound::kind).collect()
    }

    /// Returns `true` if any variable carries a bound.
    #[must_use]
    pub fn any_bounded(&self) -> bool {
        self.0.iter().any(|b| b.kind() != BoundType::Unbounded)
    }

    /// Returns `true` if every variable is bounded on both sides.
    #[must_use]
    pub fn all_doubly_bounded(&self) -> bool {
        self.0.iter().all(|b| b.kind() == BoundType::LowerAndUpper)
    }
}

impl From<Bounds> for Vec<Bound> {
    fn from(bounds: Bounds) -> Self {
        bounds.0
    }
}
