//! Collection and payment settlement curves.

use crate::config::ConfigError;

/// Supplies the settlement curves used for receivables and payables.
///
/// Each pattern gives the fraction of an amount settled `k` periods after
/// its delay has elapsed. The period model is a pure function of the
/// provider, so implementations must be deterministic and thread-safe.
pub trait PaymentPatternProvider: Send + Sync {
    /// Fractions of receivables collected per period after the DSO delay.
    fn collection_pattern(&self) -> &[f64];

    /// Fractions of payables paid per period after the DPO delay.
    fn payment_pattern(&self) -> &[f64];
}

/// Front-loaded policy curves: 60/30/10 for collections, 70/20/10 for
/// payments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StandardPaymentPatterns;

/// Standard collection curve.
pub const STANDARD_COLLECTION_PATTERN: [f64; 3] = [0.60, 0.30, 0.10];

/// Standard payment curve.
pub const STANDARD_PAYMENT_PATTERN: [f64; 3] = [0.70, 0.20, 0.10];

impl PaymentPatternProvider for StandardPaymentPatterns {
    fn collection_pattern(&self) -> &[f64] {
        &STANDARD_COLLECTION_PATTERN
    }

    fn payment_pattern(&self) -> &[f64] {
        &STANDARD_PAYMENT_PATTERN
    }
}

/// Caller-supplied settlement curves.
///
/// # Examples
///
/// ```
/// use cashflow_sim::model::{CustomPaymentPatterns, PaymentPatternProvider};
///
/// let patterns = CustomPaymentPatterns::new(vec![0.5, 0.5], vec![1.0]).unwrap();
/// assert_eq!(patterns.collection_pattern(), &[0.5, 0.5]);
///
/// assert!(CustomPaymentPatterns::new(vec![-0.1], vec![1.0]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CustomPaymentPatterns {
    collection: Vec<f64>,
    payment: Vec<f64>,
}

impl CustomPaymentPatterns {
    /// Creates validated curves.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidParameter` when a curve is empty or
    /// holds a negative or non-finite fraction.
    pub fn new(collection: Vec<f64>, payment: Vec<f64>) -> Result<Self, ConfigError> {
        validate_pattern("collection_pattern", &collection)?;
        validate_pattern("payment_pattern", &payment)?;
        Ok(Self {
            collection,
            payment,
        })
    }
}

impl PaymentPatternProvider for CustomPaymentPatterns {
    fn collection_pattern(&self) -> &[f64] {
        &self.collection
    }

    fn payment_pattern(&self) -> &[f64] {
        &self.payment
    }
}

fn validate_pattern(name: &'static str, pattern: &[f64]) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::invalid(name, "must not be empty"));
    }
    if pattern.iter().any(|f| !f.is_finite() || *f < 0.0) {
        return Err(ConfigError::invalid(name, "fractions must be finite and non-negative"));
    }
    Ok(())
}

/// Cumulative fraction of `pattern` settled by `period` after `delay`
/// periods: `Σ pattern[k]` over `k` with `period - delay - k >= 0`.
///
/// # Examples
///
/// ```
/// use cashflow_sim::model::settled_fraction;
///
/// let pattern = [0.6, 0.3, 0.1];
/// assert_eq!(settled_fraction(&pattern, 1, 0), 0.0);
/// assert_eq!(settled_fraction(&pattern, 1, 1), 0.6);
/// assert!((settled_fraction(&pattern, 1, 2) - 0.9).abs() < 1e-12);
/// assert!((settled_fraction(&pattern, 1, 9) - 1.0).abs() < 1e-12);
/// ```
#[inline]
pub fn settled_fraction(pattern: &[f64], delay: usize, period: usize) -> f64 {
    if period < delay || pattern.is_empty() {
        return 0.0;
    }
    let elapsed = (period - delay).min(pattern.len() - 1);
    pattern[..=elapsed].iter().sum()
}
