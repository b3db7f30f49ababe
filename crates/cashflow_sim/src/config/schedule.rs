//! Period-keyed schedules and the tax policy.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default number of periods between tax payments (quarterly).
pub const DEFAULT_TAX_FREQUENCY: usize = 3;

/// An amount due at one exact period.
///
/// Several entries may share a period; their amounts add up.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAmount {
    /// Zero-based period index
    pub period: usize,
    /// Amount in currency units
    pub amount: f64,
}

impl ScheduledAmount {
    /// Creates a new scheduled amount.
    pub fn new(period: usize, amount: f64) -> Self {
        Self { period, amount }
    }
}

/// Sum of every entry scheduled at `period`, or 0.
///
/// # Examples
///
/// ```
/// use cashflow_sim::config::{amount_at, ScheduledAmount};
///
/// let schedule = [ScheduledAmount::new(2, 500.0), ScheduledAmount::new(2, 250.0)];
/// assert_eq!(amount_at(&schedule, 2), 750.0);
/// assert_eq!(amount_at(&schedule, 3), 0.0);
/// ```
#[inline]
pub fn amount_at(schedule: &[ScheduledAmount], period: usize) -> f64 {
    schedule
        .iter()
        .filter(|entry| entry.period == period)
        .map(|entry| entry.amount)
        .sum()
}

pub(crate) fn validate_schedule(
    name: &'static str,
    schedule: &[ScheduledAmount],
    allow_negative: bool,
) -> Result<(), ConfigError> {
    for entry in schedule {
        if !entry.amount.is_finite() {
            return Err(ConfigError::invalid(
                name,
                format!("amount at period {} must be finite", entry.period),
            ));
        }
        if !allow_negative && entry.amount < 0.0 {
            return Err(ConfigError::invalid(
                name,
                format!(
                    "amount {} at period {} must be non-negative",
                    entry.amount, entry.period
                ),
            ));
        }
    }
    Ok(())
}

/// Tax policy.
///
/// Without an explicit schedule, tax is charged every `frequency` periods
/// (at `period % frequency == 0`) on the positive operating result of the
/// periods since the previous charge. An explicit schedule replaces that
/// rule: the scheduled amounts are paid at exactly their periods and
/// nothing else.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxPolicy {
    /// Rate applied to a positive operating result, in [0, 1]
    pub rate: f64,
    /// Periods between tax payments
    pub frequency: usize,
    /// Explicit tax payments keyed by period
    pub schedule: Vec<ScheduledAmount>,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            rate: 0.0,
            frequency: DEFAULT_TAX_FREQUENCY,
            schedule: Vec::new(),
        }
    }
}

impl TaxPolicy {
    /// Creates a rate-based policy with the default quarterly frequency.
    pub fn with_rate(rate: f64) -> Self {
        Self {
            rate,
            ..Self::default()
        }
    }

    /// Creates a policy that pays exactly the scheduled amounts.
    pub fn scheduled(schedule: Vec<ScheduledAmount>) -> Self {
        Self {
            schedule,
            ..Self::default()
        }
    }

    /// Returns true when `period` is a tax period under the frequency rule.
    #[inline]
    pub fn is_tax_period(&self, period: usize) -> bool {
        self.frequency > 0 && period % self.frequency == 0
    }

    /// Validates the policy.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the rate is outside [0, 1], the frequency is
    /// 0, or a scheduled amount is negative or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rate.is_finite() || !(0.0..=1.0).contains(&self.rate) {
            return Err(ConfigError::invalid(
                "tax.rate",
                format!("{} must be in [0, 1]", self.rate),
            ));
        }
        if self.frequency == 0 {
            return Err(ConfigError::invalid("tax.frequency", "must be at least 1"));
        }
        validate_schedule("tax.schedule", &self.schedule, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_quarterly_and_untaxed() {
        let policy = TaxPolicy::default();
        assert_eq!(policy.rate, 0.0);
        assert!(policy.is_tax_period(0));
        assert!(!policy.is_tax_period(1));
        assert!(policy.is_tax_period(3));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_invalid_rate() {
        assert!(TaxPolicy::with_rate(1.5).validate().is_err());
        assert!(TaxPolicy::with_rate(-0.1).validate().is_err());
        assert!(TaxPolicy::with_rate(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let policy = TaxPolicy {
            frequency: 0,
            ..TaxPolicy::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(ConfigError::InvalidParameter {
                name: "tax.frequency",
                ..
            })
        ));
    }

    #[test]
    fn test_schedule_sign_rules() {
        let negative = [ScheduledAmount::new(1, -10.0)];
        assert!(validate_schedule("one_time_items", &negative, true).is_ok());
        assert!(validate_schedule("capex_schedule", &negative, false).is_err());

        let infinite = [ScheduledAmount::new(1, f64::INFINITY)];
        assert!(validate_schedule("one_time_items", &infinite, true).is_err());
    }
}
