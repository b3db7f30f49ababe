//! Cash-flow period model.
//!
//! A deterministic function of one iteration's sampled drivers and a period
//! index. Settlement curves for receivables and payables come from a
//! [`PaymentPatternProvider`]; [`StandardPaymentPatterns`] is the default.

mod drivers;
mod patterns;
mod period;

pub use drivers::{
    delay_periods, Drivers, VariableValues, DPO, DSO, INFLATION, OPERATING_EXPENSES, PAYABLES,
    RECEIVABLES, REVENUE, REVENUE_GROWTH, TAX_RATE,
};
pub use patterns::{
    settled_fraction, CustomPaymentPatterns, PaymentPatternProvider, StandardPaymentPatterns,
    STANDARD_COLLECTION_PATTERN, STANDARD_PAYMENT_PATTERN,
};
pub use period::{CashFlowModel, PeriodBreakdown};
