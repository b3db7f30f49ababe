//! Variable specifications.
//!
//! A [`VariableSpec`] names one uncertain input of the cash-flow model and
//! the distribution family it is drawn from. Specs are immutable once a
//! simulation starts and are validated eagerly via [`VariableSpec::validate`].

use super::error::DistributionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Caller-supplied deterministic transform applied to a normal shock.
///
/// Wraps a shared closure so that specs stay `Clone + Send + Sync`.
/// The label only serves diagnostics.
#[derive(Clone)]
pub struct CustomTransform {
    label: String,
    transform: Arc<dyn Fn(f64) -> f64 + Send + Sync>,
}

impl CustomTransform {
    /// Creates a labelled transform.
    pub fn new<F>(label: impl Into<String>, transform: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            transform: Arc::new(transform),
        }
    }

    /// Returns the diagnostic label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Applies the transform to a shock value.
    #[inline]
    pub fn apply(&self, shock: f64) -> f64 {
        (self.transform)(shock)
    }
}

impl fmt::Debug for CustomTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomTransform")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Distribution family with its parameters.
///
/// Serialised with an internal `type` tag, e.g.
/// `{ type = "uniform", min = 0.0, max = 1.0 }` in TOML.
/// `Custom` holds a closure and therefore cannot be (de)serialised.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Distribution {
    /// `mean + std_dev * z`.
    Normal {
        /// Mean
        mean: f64,
        /// Standard deviation (>= 0)
        std_dev: f64,
    },
    /// `exp(mean + std_dev * z)`; parameters are in log space.
    #[serde(alias = "log_normal")]
    Lognormal {
        /// Mean of the underlying normal
        mean: f64,
        /// Standard deviation of the underlying normal (>= 0)
        std_dev: f64,
    },
    /// Uniform on `[min, max)`.
    Uniform {
        /// Lower bound
        min: f64,
        /// Upper bound (> min)
        max: f64,
    },
    /// Triangular with the given mode.
    Triangular {
        /// Lower bound
        min: f64,
        /// Most likely value, within `[min, max]`
        mode: f64,
        /// Upper bound (> min)
        max: f64,
    },
    /// Beta on `[0, 1]` rescaled into `[min, max]`.
    Beta {
        /// First shape parameter (> 0)
        alpha: f64,
        /// Second shape parameter (> 0)
        beta: f64,
        /// Lower bound of the rescaled support
        #[serde(default)]
        min: f64,
        /// Upper bound of the rescaled support
        #[serde(default = "unit")]
        max: f64,
    },
    /// Exponential with rate `lambda`.
    Exponential {
        /// Rate (> 0)
        lambda: f64,
    },
    /// Weibull with the given shape and scale.
    Weibull {
        /// Shape (> 0)
        shape: f64,
        /// Scale (> 0)
        scale: f64,
    },
    /// Uniform draw from a historical sample.
    Empirical {
        /// Observed values (non-empty)
        samples: Vec<f64>,
    },
    /// Deterministic transform of a standard-normal shock.
    #[serde(skip)]
    Custom(CustomTransform),
}

fn unit() -> f64 {
    1.0
}

impl Distribution {
    /// Returns the family name.
    pub fn family(&self) -> &'static str {
        match self {
            Distribution::Normal { .. } => "normal",
            Distribution::Lognormal { .. } => "lognormal",
            Distribution::Uniform { .. } => "uniform",
            Distribution::Triangular { .. } => "triangular",
            Distribution::Beta { .. } => "beta",
            Distribution::Exponential { .. } => "exponential",
            Distribution::Weibull { .. } => "weibull",
            Distribution::Empirical { .. } => "empirical",
            Distribution::Custom(_) => "custom",
        }
    }

    /// Returns true when the family consumes the correlated shock.
    #[inline]
    pub fn uses_shock(&self) -> bool {
        matches!(
            self,
            Distribution::Normal { .. } | Distribution::Lognormal { .. } | Distribution::Custom(_)
        )
    }
}

/// Named uncertain input of the cash-flow model.
///
/// # Examples
///
/// ```
/// use cashflow_core::distributions::{Distribution, VariableSpec};
///
/// let spec = VariableSpec::new("dso", Distribution::Triangular { min: 30.0, mode: 45.0, max: 90.0 });
/// assert!(spec.validate().is_ok());
///
/// let bad = VariableSpec::new("dso", Distribution::Uniform { min: 10.0, max: 10.0 });
/// assert!(bad.validate().is_err());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Variable name, unique within a configuration.
    pub name: String,
    /// Distribution the variable is drawn from.
    #[serde(flatten)]
    pub distribution: Distribution,
}

impl VariableSpec {
    /// Creates a new variable specification.
    pub fn new(name: impl Into<String>, distribution: Distribution) -> Self {
        Self {
            name: name.into(),
            distribution,
        }
    }

    /// Checks the parameters against the family's domain.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionError::InvalidDistributionParameters`] for
    /// non-finite parameters, `max <= min`, a mode outside the bounds,
    /// negative standard deviations, non-positive rates/shapes/scales, or
    /// an empty empirical sample.
    pub fn validate(&self) -> Result<(), DistributionError> {
        let name = self.name.as_str();
        if name.trim().is_empty() {
            return Err(DistributionError::invalid(name, "variable name must not be empty"));
        }

        match &self.distribution {
            Distribution::Normal { mean, std_dev } | Distribution::Lognormal { mean, std_dev } => {
                require_finite(name, "mean", *mean)?;
                require_finite(name, "std_dev", *std_dev)?;
                if *std_dev < 0.0 {
                    return Err(DistributionError::invalid(
                        name,
                        format!("std_dev must be non-negative, got {}", std_dev),
                    ));
                }
            }
            Distribution::Uniform { min, max } => {
                require_bounds(name, *min, *max)?;
            }
            Distribution::Triangular { min, mode, max } => {
                require_bounds(name, *min, *max)?;
                require_finite(name, "mode", *mode)?;
                if mode < min || mode > max {
                    return Err(DistributionError::invalid(
                        name,
                        format!("mode {} must lie within [{}, {}]", mode, min, max),
                    ));
                }
            }
            Distribution::Beta {
                alpha,
                beta,
                min,
                max,
            } => {
                require_positive(name, "alpha", *alpha)?;
                require_positive(name, "beta", *beta)?;
                require_bounds(name, *min, *max)?;
            }
            Distribution::Exponential { lambda } => {
                require_positive(name, "lambda", *lambda)?;
            }
            Distribution::Weibull { shape, scale } => {
                require_positive(name, "shape", *shape)?;
                require_positive(name, "scale", *scale)?;
            }
            Distribution::Empirical { samples } => {
                if samples.is_empty() {
                    return Err(DistributionError::invalid(
                        name,
                        "empirical sample set must not be empty",
                    ));
                }
                if let Some(bad) = samples.iter().find(|v| !v.is_finite()) {
                    return Err(DistributionError::invalid(
                        name,
                        format!("empirical sample contains non-finite value {}", bad),
                    ));
                }
            }
            Distribution::Custom(_) => {}
        }
        Ok(())
    }
}

fn require_finite(variable: &str, param: &str, value: f64) -> Result<(), DistributionError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DistributionError::invalid(
            variable,
            format!("{} must be finite, got {}", param, value),
        ))
    }
}

fn require_positive(variable: &str, param: &str, value: f64) -> Result<(), DistributionError> {
    require_finite(variable, param, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(DistributionError::invalid(
            variable,
            format!("{} must be positive, got {}", param, value),
        ))
    }
}

fn require_bounds(variable: &str, min: f64, max: f64) -> Result<(), DistributionError> {
    require_finite(variable, "min", min)?;
    require_finite(variable, "max", max)?;
    if max <= min {
        return Err(DistributionError::invalid(
            variable,
            format!("max ({}) must exceed min ({})", max, min),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(distribution: Distribution) -> VariableSpec {
        VariableSpec::new("x", distribution)
    }

    #[test]
    fn test_valid_specs() {
        let valid = [
            Distribution::Normal {
                mean: 0.0,
                std_dev: 0.0,
            },
            Distribution::Lognormal {
                mean: 1.0,
                std_dev: 0.5,
            },
            Distribution::Uniform { min: -1.0, max: 1.0 },
            Distribution::Triangular {
                min: 0.0,
                mode: 0.0,
                max: 2.0,
            },
            Distribution::Beta {
                alpha: 2.0,
                beta: 5.0,
                min: 0.0,
                max: 1.0,
            },
            Distribution::Exponential { lambda: 0.5 },
            Distribution::Weibull {
                shape: 1.5,
                scale: 2.0,
            },
            Distribution::Empirical {
                samples: vec![1.0, 2.0],
            },
            Distribution::Custom(CustomTransform::new("identity", |z| z)),
        ];
        for d in valid {
            assert!(spec(d.clone()).validate().is_ok(), "{:?}", d);
        }
    }

    #[test]
    fn test_negative_std_dev_rejected() {
        let err = spec(Distribution::Normal {
            mean: 1.0,
            std_dev: -0.1,
        })
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            DistributionError::InvalidDistributionParameters { .. }
        ));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(spec(Distribution::Uniform { min: 2.0, max: 1.0 })
            .validate()
            .is_err());
        assert!(spec(Distribution::Beta {
            alpha: 1.0,
            beta: 1.0,
            min: 1.0,
            max: 1.0
        })
        .validate()
        .is_err());
    }

    #[test]
    fn test_mode_outside_bounds_rejected() {
        assert!(spec(Distribution::Triangular {
            min: 0.0,
            mode: 3.0,
            max: 2.0
        })
        .validate()
        .is_err());
    }

    #[test]
    fn test_non_positive_rates_rejected() {
        assert!(spec(Distribution::Exponential { lambda: 0.0 })
            .validate()
            .is_err());
        assert!(spec(Distribution::Weibull {
            shape: -1.0,
            scale: 1.0
        })
        .validate()
        .is_err());
        assert!(spec(Distribution::Beta {
            alpha: 0.0,
            beta: 1.0,
            min: 0.0,
            max: 1.0
        })
        .validate()
        .is_err());
    }

    #[test]
    fn test_empty_empirical_rejected() {
        assert!(spec(Distribution::Empirical { samples: vec![] })
            .validate()
            .is_err());
        assert!(spec(Distribution::Empirical {
            samples: vec![1.0, f64::NAN]
        })
        .validate()
        .is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let s = VariableSpec::new(" ", Distribution::Exponential { lambda: 1.0 });
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_serde_tagged_round_trip() {
        let json = r#"{"name":"dso","type":"triangular","min":30.0,"mode":45.0,"max":90.0}"#;
        let parsed: VariableSpec = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.name, "dso");
        assert_eq!(parsed.distribution.family(), "triangular");

        let beta = r#"{"name":"m","type":"beta","alpha":2.0,"beta":3.0}"#;
        let parsed: VariableSpec = serde_json::from_str(beta).unwrap();
        match parsed.distribution {
            Distribution::Beta { min, max, .. } => {
                assert_eq!(min, 0.0);
                assert_eq!(max, 1.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_uses_shock() {
        assert!(Distribution::Normal {
            mean: 0.0,
            std_dev: 1.0
        }
        .uses_shock());
        assert!(!Distribution::Uniform { min: 0.0, max: 1.0 }.uses_shock());
    }
}
