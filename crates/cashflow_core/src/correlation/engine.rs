//! Correlated shock generation for one iteration.

use super::error::CorrelationError;
use super::matrix::{CholeskyFactor, CorrelationMatrix, CorrelationPair};
use crate::rng::SimRng;

/// Projects independent standard normals into correlated shocks.
///
/// Built once per run and shared read-only across iterations. With no
/// correlations configured the factor is skipped entirely and draws pass
/// through unchanged, which is what the identity factor would produce.
///
/// # Examples
///
/// ```
/// use cashflow_core::correlation::{CorrelationEngine, CorrelationPair};
/// use cashflow_core::rng::SimRng;
///
/// let names = ["revenue", "receivables"];
/// let engine = CorrelationEngine::build(&names, &[CorrelationPair::new("revenue", "receivables", 0.8)]).unwrap();
///
/// let mut rng = SimRng::from_seed(9);
/// let mut shocks = vec![0.0; 2];
/// engine.draw_shocks(&mut rng, &mut shocks);
/// assert!(shocks.iter().all(|s| s.is_finite()));
/// ```
#[derive(Clone, Debug)]
pub struct CorrelationEngine {
    dim: usize,
    factor: Option<CholeskyFactor<f64>>,
}

impl CorrelationEngine {
    /// Builds the matrix from `pairs` and decomposes it when needed.
    ///
    /// # Errors
    ///
    /// Propagates [`CorrelationError`] from matrix construction.
    pub fn build<S: AsRef<str>>(
        variables: &[S],
        pairs: &[CorrelationPair],
    ) -> Result<Self, CorrelationError> {
        let matrix = CorrelationMatrix::<f64>::from_pairs(variables, pairs)?;
        Ok(Self::from_matrix(&matrix))
    }

    /// Wraps an already assembled matrix.
    pub fn from_matrix(matrix: &CorrelationMatrix<f64>) -> Self {
        let factor = if matrix.is_identity() {
            None
        } else {
            Some(matrix.cholesky())
        };
        Self {
            dim: matrix.dim(),
            factor,
        }
    }

    /// Number of variables covered.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns true when a Cholesky factor is applied.
    pub fn is_correlated(&self) -> bool {
        self.factor.is_some()
    }

    /// Returns true when factorisation had to clamp a negative pivot.
    pub fn is_degraded(&self) -> bool {
        self.factor.as_ref().is_some_and(CholeskyFactor::was_clamped)
    }

    /// Projects independent draws in place.
    ///
    /// # Panics
    ///
    /// Panics if the engine is correlated and `draws` is shorter than
    /// [`dim`](Self::dim).
    pub fn project(&self, draws: &mut [f64]) {
        if let Some(factor) = &self.factor {
            let independent = draws.to_vec();
            factor.transform_into(&independent, draws);
        }
    }

    /// Fills `out` with one vector of correlated standard-normal shocks.
    ///
    /// # Panics
    ///
    /// Panics under the same condition as [`project`](Self::project).
    pub fn draw_shocks(&self, rng: &mut SimRng, out: &mut [f64]) {
        rng.fill_normal(out);
        self.project(out);
    }
}
