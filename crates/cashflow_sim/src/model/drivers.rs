//! Well-known driver names and their resolved per-iteration values.

use std::collections::BTreeMap;

/// Per-period revenue, cash-settled.
pub const REVENUE: &str = "revenue";
/// Annual revenue growth rate.
pub const REVENUE_GROWTH: &str = "revenue_growth";
/// Per-period credit sales collected with a DSO delay.
pub const RECEIVABLES: &str = "receivables";
/// Days sales outstanding.
pub const DSO: &str = "dso";
/// Per-period operating expenses.
pub const OPERATING_EXPENSES: &str = "operating_expenses";
/// Annual expense inflation rate.
pub const INFLATION: &str = "inflation";
/// Per-period credit purchases paid with a DPO delay.
pub const PAYABLES: &str = "payables";
/// Days payable outstanding.
pub const DPO: &str = "dpo";
/// Tax rate overriding the configured policy rate.
pub const TAX_RATE: &str = "tax_rate";

/// Sampled value of every variable in one iteration, keyed by name.
pub type VariableValues = BTreeMap<String, f64>;

/// Driver values resolved from one iteration's variables.
///
/// Absent drivers are 0; an absent `tax_rate` defers to the configured
/// policy. Variables with other names are carried in the iteration result
/// but do not enter the cash-flow model.
///
/// # Examples
///
/// ```
/// use cashflow_sim::model::{Drivers, VariableValues};
///
/// let mut values = VariableValues::new();
/// values.insert("revenue".to_string(), 12_000.0);
/// values.insert("dso".to_string(), 45.0);
///
/// let drivers = Drivers::from_values(&values);
/// assert_eq!(drivers.revenue, 12_000.0);
/// assert_eq!(drivers.operating_expenses, 0.0);
/// assert_eq!(drivers.tax_rate, None);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Drivers {
    /// Per-period revenue
    pub revenue: f64,
    /// Annual growth rate
    pub revenue_growth: f64,
    /// Per-period credit sales
    pub receivables: f64,
    /// Days sales outstanding
    pub dso: f64,
    /// Per-period operating expenses
    pub operating_expenses: f64,
    /// Annual inflation rate
    pub inflation: f64,
    /// Per-period credit purchases
    pub payables: f64,
    /// Days payable outstanding
    pub dpo: f64,
    /// Sampled tax rate, if the variable is configured
    pub tax_rate: Option<f64>,
}

impl Drivers {
    /// Resolves drivers from named values.
    pub fn from_values(values: &VariableValues) -> Self {
        let get = |name: &str| values.get(name).copied().unwrap_or(0.0);
        Self {
            revenue: get(REVENUE),
            revenue_growth: get(REVENUE_GROWTH),
            receivables: get(RECEIVABLES),
            dso: get(DSO),
            operating_expenses: get(OPERATING_EXPENSES),
            inflation: get(INFLATION),
            payables: get(PAYABLES),
            dpo: get(DPO),
            tax_rate: values.get(TAX_RATE).copied(),
        }
    }

    /// Returns a copy with revenue and operating expenses scaled.
    ///
    /// Used by stress scenarios; every other driver is left untouched.
    pub fn stressed(&self, revenue_factor: f64, expense_factor: f64) -> Self {
        Self {
            revenue: self.revenue * revenue_factor,
            operating_expenses: self.operating_expenses * expense_factor,
            ..*self
        }
    }
}

/// Whole settlement periods for a days-outstanding figure: `floor(days / 30)`.
///
/// Non-positive and non-finite inputs settle immediately.
#[inline]
pub fn delay_periods(days: f64) -> usize {
    if days.is_finite() && days > 0.0 {
        (days / 30.0).floor() as usize
    } else {
        0
    }
}
