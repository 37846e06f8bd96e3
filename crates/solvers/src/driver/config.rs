#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::Verbosity;

/// Convergence and budget settings for a driven run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Fields"))]
pub struct Config {
    factr: f64,
    pgtol: f64,
    max_evaluations: usize,
    verbosity: Verbosity,
}

/// Errors that can occur when validating a driver config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("factr must be finite and non-negative")]
    Factr,

    #[error("pgtol must be finite and non-negative")]
    Pgtol,

    #[error("max_evaluations must be at least 1")]
    MaxEvaluations,
}

impl Default for Config {
    /// `factr = 1e7` (moderate accuracy), `pgtol = 1e-5`, 15 000 evaluations, silent.
    fn default() -> Self {
        Self {
            factr: 1e7,
            pgtol: 1e-5,
            max_evaluations: 15_000,
            verbosity: Verbosity::SILENT,
        }
    }
}

impl Config {
    /// Creates a new config with validated tolerances and budget.
    ///
    /// A tolerance of zero disables its convergence test. Typical `factr`
    /// values are `1e12` for low accuracy, `1e7` for moderate accuracy and
    /// `1e1` for extremely high accuracy.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance is negative or non-finite, or if
    /// `max_evaluations` is zero.
    pub fn new(factr: f64, pgtol: f64, max_evaluations: usize) -> Result<Self, ConfigError> {
        if !factr.is_finite() || factr < 0.0 {
            return Err(ConfigError::Factr);
        }
        if !pgtol.is_finite() || pgtol < 0.0 {
            return Err(ConfigError::Pgtol);
        }
        if max_evaluations == 0 {
            return Err(ConfigError::MaxEvaluations);
        }

        Ok(Self {
            factr,
            pgtol,
            max_evaluations,
            verbosity: Verbosity::SILENT,
        })
    }

    /// Returns this config with a different verbosity.
    #[must_use]
    pub fn with_verbosity(self, verbosity: Verbosity) -> Self {
        Self { verbosity, ..self }
    }

    /// Returns the relative function-decrease factor.
    #[must_use]
    pub fn factr(&self) -> f64 {
        self.factr
    }

    /// Returns the projected-gradient tolerance.
    #[must_use]
    pub fn pgtol(&self) -> f64 {
        self.pgtol
    }

    /// Returns the maximum number of objective evaluations.
    #[must_use]
    pub fn max_evaluations(&self) -> usize {
        self.max_evaluations
    }

    /// Returns the verbosity forwarded to the solver.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

/// Unvalidated form used when deserializing.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct Fields {
    factr: f64,
    pgtol: f64,
    max_evaluations: usize,
    #[serde(default)]
    verbosity: Verbosity,
}

#[cfg(feature = "serde")]
impl TryFrom<Fields> for Config {
    type Error = ConfigError;

    fn try_from(fields: Fields) -> Result<Self, Self::Error> {
        Ok(Self::new(fields.factr, fields.pgtol, fields.max_evaluations)?
            .with_verbosity(fields.verbosity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let config = Config::default();
        assert_eq!(config.factr(), 1e7);
        assert_eq!(config.pgtol(), 1e-5);
        assert_eq!(config.max_evaluations(), 15_000);
        assert!(config.verbosity().is_silent());
    }

    #[test]
    fn zero_tolerances_are_allowed() {
        let config = Config::new(0.0, 0.0, 1).unwrap();
        assert_eq!(config.factr(), 0.0);
        assert_eq!(config.pgtol(), 0.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(Config::new(-1.0, 1e-5, 10), Err(ConfigError::Factr));
        assert_eq!(Config::new(f64::INFINITY, 1e-5, 10), Err(ConfigError::Factr));
        assert_eq!(Config::new(1e7, f64::NAN, 10), Err(ConfigError::Pgtol));
        assert_eq!(Config::new(1e7, 1e-5, 0), Err(ConfigError::MaxEvaluations));
    }

    #[test]
    fn with_verbosity_keeps_the_rest() {
        let config = Config::new(1e12, 1e-3, 50)
            .unwrap()
            .with_verbosity(Verbosity::DETAIL);
        assert_eq!(config.verbosity(), Verbosity::DETAIL);
        assert_eq!(config.max_evaluations(), 50);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializing_validates() {
        let config: Config =
            serde_json::from_str(r#"{"factr":1e1,"pgtol":0.0,"max_evaluations":7,"verbosity":99}"#)
                .unwrap();
        assert_eq!(config.verbosity(), Verbosity::DETAIL);
        assert_eq!(config.max_evaluations(), 7);

        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), config);

        let bad = serde_json::from_str::<Config>(r#"{"factr":-1.0,"pgtol":0.0,"max_evaluations":7}"#);
        assert!(bad.is_err());
    }
}
