//! Top-level error type for simulation runs.
//!
//! Every failure is fatal: a run either returns a complete
//! [`AnalysisResult`](crate::analysis::AnalysisResult) or one of these
//! errors, never a partial result.

use crate::config::ConfigError;
use cashflow_core::correlation::CorrelationError;
use cashflow_core::distributions::DistributionError;
use thiserror::Error;

/// Simulation errors.
///
/// # Variants
/// - `InvalidConfig`: structural configuration problems (counts, schedules, files)
/// - `InvalidDistributionParameters`: a malformed variable specification
/// - `InvalidCorrelationSpec`: a malformed correlation entry
/// - `Sampling`: rejection sampling exhausted its budget, or a draw was
///   not finite, mid-run
/// - `Cancelled`: the caller's cancellation token was triggered
///
/// # Examples
/// ```
/// use cashflow_sim::SimulationError;
///
/// let err = SimulationError::Cancelled { completed: 10, requested: 100 };
/// assert_eq!(err.to_string(), "Simulation cancelled after 10 of 100 iterations");
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulationError {
    /// Configuration failed structural validation.
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    /// A variable specification is malformed.
    #[error(transparent)]
    InvalidDistributionParameters(DistributionError),

    /// A correlation entry is malformed.
    #[error(transparent)]
    InvalidCorrelationSpec(#[from] CorrelationError),

    /// Sampling failed during an iteration.
    #[error(transparent)]
    Sampling(DistributionError),

    /// The run was cancelled cooperatively.
    #[error("Simulation cancelled after {completed} of {requested} iterations")]
    Cancelled {
        /// Iterations finished before cancellation was observed
        completed: usize,
        /// Iterations requested
        requested: usize,
    },
}

impl From<DistributionError> for SimulationError {
    fn from(err: DistributionError) -> Self {
        match err {
            DistributionError::InvalidDistributionParameters { .. } => {
                SimulationError::InvalidDistributionParameters(err)
            }
            DistributionError::Sampling { .. } | DistributionError::NonFiniteSample { .. } => {
                SimulationError::Sampling(err)
            }
        }
    }
}
