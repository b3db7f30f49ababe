//! Error types for variable specification and sampling.

use thiserror::Error;

/// Distribution errors.
///
/// # Variants
/// - `InvalidDistributionParameters`: malformed variable specification,
///   detected when the configuration is validated
/// - `Sampling`: rejection sampling exhausted its attempt budget
/// - `NonFiniteSample`: a draw overflowed or a custom transform returned
///   NaN or infinity
///
/// # Examples
/// ```
/// use cashflow_core::distributions::DistributionError;
///
/// let err = DistributionError::Sampling { variable: "margin".to_string(), attempts: 10_000 };
/// assert!(err.to_string().contains("10000"));
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DistributionError {
    /// Variable specification has parameters outside the family's domain.
    #[error("Invalid distribution parameters for '{variable}': {reason}")]
    InvalidDistributionParameters {
        /// Variable name
        variable: String,
        /// Description of the violated constraint
        reason: String,
    },

    /// Rejection sampling did not accept a candidate within the budget.
    #[error("Sampling failed for '{variable}': no acceptance after {attempts} attempts")]
    Sampling {
        /// Variable name
        variable: String,
        /// Number of attempts made
        attempts: usize,
    },

    /// A draw was NaN or infinite.
    #[error("Sampling failed for '{variable}': drew non-finite value {value}")]
    NonFiniteSample {
        /// Variable name
        variable: String,
        /// The offending draw
        value: f64,
    },
}

impl DistributionError {
    pub(crate) fn invalid(variable: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDistributionParameters {
            variable: variable.to_string(),
            reason: reason.into(),
        }
    }
}
