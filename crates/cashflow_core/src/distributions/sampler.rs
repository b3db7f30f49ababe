//! Distribution sampler.
//!
//! One draw per call from the family named by a [`VariableSpec`]. Normal,
//! log-normal and custom families consume the supplied standard-normal
//! shock when present (this is how the correlation engine correlates them);
//! every other family draws its own uniforms from the iteration generator.
//!
//! Specs are assumed validated; the sampler does not re-check parameters.

use super::error::DistributionError;
use super::spec::{Distribution, VariableSpec};
use crate::rng::SimRng;

/// Default attempt budget for beta rejection sampling.
pub const DEFAULT_MAX_REJECTION_ATTEMPTS: usize = 10_000;

/// Distribution sampler with a bounded rejection budget.
///
/// # Examples
///
/// ```
/// use cashflow_core::distributions::{Distribution, Sampler, VariableSpec};
/// use cashflow_core::rng::SimRng;
///
/// let sampler = Sampler::default();
/// let spec = VariableSpec::new("capex", Distribution::Uniform { min: 10.0, max: 20.0 });
/// let mut rng = SimRng::from_seed(1);
///
/// let x = sampler.sample(&spec, None, &mut rng).unwrap();
/// assert!((10.0..20.0).contains(&x));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sampler {
    max_rejection_attempts: usize,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REJECTION_ATTEMPTS)
    }
}

impl Sampler {
    /// Creates a sampler; a zero budget is raised to one attempt.
    pub fn new(max_rejection_attempts: usize) -> Self {
        Self {
            max_rejection_attempts: max_rejection_attempts.max(1),
        }
    }

    /// Returns the rejection attempt budget.
    #[inline]
    pub fn max_rejection_attempts(&self) -> usize {
        self.max_rejection_attempts
    }

    /// Draws one value for `spec`.
    ///
    /// # Arguments
    ///
    /// * `spec` - Validated variable specification
    /// * `shock` - Optional pre-generated standard-normal draw
    /// * `rng` - The iteration's generator
    ///
    /// # Errors
    ///
    /// Returns [`DistributionError::Sampling`] when beta rejection sampling
    /// exhausts its budget and [`DistributionError::NonFiniteSample`] when
    /// the draw is NaN or infinite (lognormal overflow, custom transforms).
    pub fn sample(
        &self,
        spec: &VariableSpec,
        shock: Option<f64>,
        rng: &mut SimRng,
    ) -> Result<f64, DistributionError> {
        let value = match &spec.distribution {
            Distribution::Normal { mean, std_dev } => {
                normal(*mean, *std_dev, shock.unwrap_or_else(|| rng.gen_normal()))
            }
            Distribution::Lognormal { mean, std_dev } => {
                normal(*mean, *std_dev, shock.unwrap_or_else(|| rng.gen_normal())).exp()
            }
            Distribution::Uniform { min, max } => min + rng.gen_uniform() * (max - min),
            Distribution::Triangular { min, mode, max } => {
                triangular(*min, *mode, *max, rng.gen_uniform())
            }
            Distribution::Beta {
                alpha,
                beta,
                min,
                max,
            } => {
                let x = self.beta_unit(&spec.name, *alpha, *beta, rng)?;
                min + x * (max - min)
            }
            Distribution::Exponential { lambda } => -(1.0 - rng.gen_uniform()).ln() / lambda,
            Distribution::Weibull { shape, scale } => {
                scale * (-(1.0 - rng.gen_uniform()).ln()).powf(1.0 / shape)
            }
            Distribution::Empirical { samples } => samples[rng.gen_index(samples.len())],
            Distribution::Custom(transform) => {
                transform.apply(shock.unwrap_or_else(|| rng.gen_normal()))
            }
        };
        if !value.is_finite() {
            return Err(DistributionError::NonFiniteSample {
                variable: spec.name.clone(),
                value,
            });
        }
        Ok(value)
    }

    /// Rejection sampling on [0, 1] against `x^(α-1) (1-x)^(β-1)`.
    ///
    /// The envelope is the unit square, so acceptance collapses for large
    /// shape parameters; the budget turns that into an explicit error.
    fn beta_unit(
        &self,
        variable: &str,
        alpha: f64,
        beta: f64,
        rng: &mut SimRng,
    ) -> Result<f64, DistributionError> {
        for _ in 0..self.max_rejection_attempts {
            let x = rng.gen_uniform();
            let y = rng.gen_uniform();
            let density = x.powf(alpha - 1.0) * (1.0 - x).powf(beta - 1.0);
            if y <= density {
                return Ok(x);
            }
        }
        Err(DistributionError::Sampling {
            variable: variable.to_string(),
            attempts: self.max_rejection_attempts,
        })
    }
}

#[inline]
fn normal(mean: f64, std_dev: f64, z: f64) -> f64 {
    mean + std_dev * z
}

/// Inverse CDF of the triangular distribution.
#[inline]
fn triangular(min: f64, mode: f64, max: f64, u: f64) -> f64 {
    let range = max - min;
    let split = (mode - min) / range;
    if u < split {
        min + (u * range * (mode - min)).sqrt()
    } else {
        max - ((1.0 - u) * range * (max - mode)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::CustomTransform;
    use approx::assert_relative_eq;

    fn draws(distribution: Distribution, n: usize, seed: u64) -> Vec<f64> {
        let spec = VariableSpec::new("x", distribution);
        let sampler = Sampler::default();
        let mut rng = SimRng::from_seed(seed);
        (0..n)
            .map(|_| sampler.sample(&spec, None, &mut rng).unwrap())
            .collect()
    }

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    fn std_dev(values: &[f64]) -> f64 {
        let m = mean(values);
        (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64).sqrt()
    }

    // ==========================================================
    // Shock handling
    // ==========================================================

    #[test]
    fn test_normal_uses_shock() {
        let spec = VariableSpec::new(
            "x",
            Distribution::Normal {
                mean: 100.0,
                std_dev: 10.0,
            },
        );
        let mut rng = SimRng::from_seed(1);
        let x = Sampler::default()
            .sample(&spec, Some(1.5), &mut rng)
            .unwrap();
        assert_relative_eq!(x, 115.0);
    }

    #[test]
    fn test_lognormal_uses_shock() {
        let spec = VariableSpec::new(
            "x",
            Distribution::Lognormal {
                mean: 0.0,
                std_dev: 1.0,
            },
        );
        let mut rng = SimRng::from_seed(1);
        let x = Sampler::default()
            .sample(&spec, Some(1.0), &mut rng)
            .unwrap();
        assert_relative_eq!(x, std::f64::consts::E);
    }

    #[test]
    fn test_custom_applies_transform_to_shock() {
        let spec = VariableSpec::new(
            "x",
            Distribution::Custom(CustomTransform::new("double", |z| 2.0 * z + 1.0)),
        );
        let mut rng = SimRng::from_seed(1);
        let x = Sampler::default()
            .sample(&spec, Some(0.25), &mut rng)
            .unwrap();
        assert_relative_eq!(x, 1.5);
    }

    #[test]
    fn test_lognormal_overflow_is_rejected() {
        let spec = VariableSpec::new(
            "revenue",
            Distribution::Lognormal {
                mean: 800.0,
                std_dev: 0.1,
            },
        );
        assert!(spec.validate().is_ok());
        let mut rng = SimRng::from_seed(2);
        let err = Sampler::default().sample(&spec, None, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            DistributionError::NonFiniteSample { ref variable, value }
                if variable == "revenue" && value == f64::INFINITY
        ));
    }

    #[test]
    fn test_custom_nan_is_rejected() {
        let spec = VariableSpec::new(
            "x",
            Distribution::Custom(CustomTransform::new("root", |z| 1_000.0 * z.sqrt())),
        );
        let mut rng = SimRng::from_seed(1);
        let sampler = Sampler::default();
        assert!(sampler.sample(&spec, Some(4.0), &mut rng).is_ok());
        assert!(matches!(
            sampler.sample(&spec, Some(-1.0), &mut rng),
            Err(DistributionError::NonFiniteSample { .. })
        ));
    }

    #[test]
    fn test_zero_std_dev_is_degenerate() {
        let values = draws(
            Distribution::Normal {
                mean: 5000.0,
                std_dev: 0.0,
            },
            100,
            3,
        );
        assert!(values.iter().all(|&v| v == 5000.0));
    }

    // ==========================================================
    // Distribution properties
    // ==========================================================

    #[test]
    fn test_uniform_bounds_and_mean() {
        let values = draws(Distribution::Uniform { min: 10.0, max: 30.0 }, 100_000, 11);
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(lo >= 10.0);
        assert!(hi <= 30.0);
        assert!((mean(&values) - 20.0).abs() / 20.0 < 0.01);
    }

    #[test]
    fn test_normal_std_dev() {
        let values = draws(
            Distribution::Normal {
                mean: 100.0,
                std_dev: 10.0,
            },
            100_000,
            12,
        );
        assert!((std_dev(&values) - 10.0).abs() / 10.0 < 0.05);
        assert!((mean(&values) - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_triangular_bounds_and_mean() {
        let values = draws(
            Distribution::Triangular {
                min: 0.0,
                mode: 3.0,
                max: 6.0,
            },
            50_000,
            13,
        );
        assert!(values.iter().all(|&v| (0.0..=6.0).contains(&v)));
        assert!((mean(&values) - 3.0).abs() < 0.05);
    }

    #[test]
    fn test_triangular_skewed_mode() {
        let values = draws(
            Distribution::Triangular {
                min: 0.0,
                mode: 0.0,
                max: 3.0,
            },
            50_000,
            14,
        );
        // Mean of triangular = (min + mode + max) / 3
        assert!((mean(&values) - 1.0).abs() < 0.03);
    }

    #[test]
    fn test_beta_rescaled_mean() {
        let values = draws(
            Distribution::Beta {
                alpha: 2.0,
                beta: 2.0,
                min: 100.0,
                max: 200.0,
            },
            20_000,
            15,
        );
        assert!(values.iter().all(|&v| (100.0..=200.0).contains(&v)));
        assert!((mean(&values) - 150.0).abs() < 1.5);
    }

    #[test]
    fn test_beta_budget_exhaustion() {
        let spec = VariableSpec::new(
            "margin",
            Distribution::Beta {
                alpha: 400.0,
                beta: 400.0,
                min: 0.0,
                max: 1.0,
            },
        );
        let sampler = Sampler::new(500);
        let mut rng = SimRng::from_seed(16);
        let err = sampler.sample(&spec, None, &mut rng).unwrap_err();
        assert_eq!(
            err,
            DistributionError::Sampling {
                variable: "margin".to_string(),
                attempts: 500
            }
        );
    }

    #[test]
    fn test_exponential_mean() {
        let values = draws(Distribution::Exponential { lambda: 0.5 }, 100_000, 17);
        assert!(values.iter().all(|&v| v >= 0.0));
        assert!((mean(&values) - 2.0).abs() / 2.0 < 0.02);
    }

    #[test]
    fn test_weibull_shape_one_is_exponential() {
        let values = draws(
            Distribution::Weibull {
                shape: 1.0,
                scale: 3.0,
            },
            100_000,
            18,
        );
        assert!((mean(&values) - 3.0).abs() / 3.0 < 0.02);
    }

    #[test]
    fn test_empirical_draws_members() {
        let samples = vec![1.0, 5.0, 9.0];
        let values = draws(
            Distribution::Empirical {
                samples: samples.clone(),
            },
            3_000,
            19,
        );
        assert!(values.iter().all(|v| samples.contains(v)));
        for s in &samples {
            assert!(values.contains(s));
        }
    }

    #[test]
    fn test_zero_budget_raised_to_one() {
        assert_eq!(Sampler::new(0).max_rejection_attempts(), 1);
    }
}
