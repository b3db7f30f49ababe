//! Deterministic per-period cash flow.

use super::drivers::{delay_periods, Drivers};
use super::patterns::{settled_fraction, PaymentPatternProvider};
use crate::config::{amount_at, SimulationConfig};
use serde::{Deserialize, Serialize};

/// Signed components of one period's cash flow.
///
/// Inflows are positive, outflows are stored as positive magnitudes and
/// subtracted in [`net`](Self::net); `one_time` keeps its sign.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodBreakdown {
    /// Seasonal, growth-adjusted revenue
    pub revenue: f64,
    /// Receivables collected this period
    pub collections: f64,
    /// Inflation-adjusted operating expenses
    pub operating_expenses: f64,
    /// Payables settled this period
    pub payables: f64,
    /// Scheduled capital expenditure
    pub capex: f64,
    /// Debt service
    pub debt_service: f64,
    /// Tax paid this period
    pub taxes: f64,
    /// Signed one-off items
    pub one_time: f64,
}

impl PeriodBreakdown {
    /// Net cash delta for the period.
    #[inline]
    pub fn net(&self) -> f64 {
        self.revenue + self.collections
            - self.operating_expenses
            - self.payables
            - self.capex
            - self.debt_service
            - self.taxes
            + self.one_time
    }
}

/// Cash-flow model bound to one configuration and pattern provider.
///
/// Pure: the same drivers and period always give the same cash flow, so
/// the model is shared read-only across worker threads and reused to
/// replay paths after the run.
#[derive(Clone, Copy)]
pub struct CashFlowModel<'a> {
    config: &'a SimulationConfig,
    patterns: &'a dyn PaymentPatternProvider,
}

impl<'a> CashFlowModel<'a> {
    /// Creates a model over `config` using `patterns` for settlement curves.
    pub fn new(config: &'a SimulationConfig, patterns: &'a dyn PaymentPatternProvider) -> Self {
        Self { config, patterns }
    }

    /// Bound configuration.
    #[inline]
    pub fn config(&self) -> &'a SimulationConfig {
        self.config
    }

    /// Net cash delta for `period`.
    #[inline]
    pub fn period_cash_flow(&self, drivers: &Drivers, period: usize) -> f64 {
        self.breakdown(drivers, period).net()
    }

    /// Component breakdown for `period`.
    pub fn breakdown(&self, drivers: &Drivers, period: usize) -> PeriodBreakdown {
        let config = self.config;
        let operating = self.operating(drivers, period);

        PeriodBreakdown {
            revenue: operating.revenue,
            collections: operating.collections,
            operating_expenses: operating.operating_expenses,
            payables: operating.payables,
            capex: amount_at(config.capex_schedule(), period),
            debt_service: config.debt_service(),
            taxes: self.taxes(drivers, period),
            one_time: amount_at(config.one_time_items(), period),
        }
    }

    /// Revenue, collections, operating expenses and payables for `period`.
    fn operating(&self, drivers: &Drivers, period: usize) -> PeriodBreakdown {
        let years = period as f64 / 12.0;
        let growth = (1.0 + drivers.revenue_growth).max(0.0).powf(years);

        PeriodBreakdown {
            revenue: drivers.revenue * self.config.seasonal_factor(period) * growth,
            collections: drivers.receivables
                * settled_fraction(
                    self.patterns.collection_pattern(),
                    delay_periods(drivers.dso),
                    period,
                ),
            operating_expenses: drivers.operating_expenses * (1.0 + drivers.inflation * years),
            payables: drivers.payables
                * settled_fraction(
                    self.patterns.payment_pattern(),
                    delay_periods(drivers.dpo),
                    period,
                ),
            ..PeriodBreakdown::default()
        }
    }

    /// Tax due at `period`.
    ///
    /// A tax period covers itself and the `frequency - 1` periods before it
    /// (fewer at the start of the horizon), so every period is taxed once.
    fn taxes(&self, drivers: &Drivers, period: usize) -> f64 {
        let policy = self.config.tax();
        if !policy.schedule.is_empty() {
            return amount_at(&policy.schedule, period);
        }
        if !policy.is_tax_period(period) {
            return 0.0;
        }
        let rate = drivers.tax_rate.unwrap_or(policy.rate).clamp(0.0, 1.0);
        if rate == 0.0 {
            return 0.0;
        }
        let first = (period + 1).saturating_sub(policy.frequency);
        let taxable: f64 = (first..=period)
            .map(|p| self.operating(drivers, p).net())
            .sum();
        rate * taxable.max(0.0)
    }
}

impl std::fmt::Debug for CashFlowModel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CashFlowModel")
            .field("horizon", &self.config.horizon())
            .field("collection_pattern", &self.patterns.collection_pattern())
            .field("payment_pattern", &self.patterns.payment_pattern())
            .finish()
    }
}
