//! Per-iteration outputs.

use crate::model::VariableValues;
use serde::{Deserialize, Serialize};

/// Cash position at the end of one period.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodOutcome {
    /// Zero-based period index
    pub period: usize,
    /// Net cash delta during the period
    pub cash_flow: f64,
    /// Closing balance
    pub balance: f64,
    /// `max(0, -balance)`
    pub shortfall: f64,
}

/// Summary of one path.
///
/// `min_cash` and `max_cash` range over the closing balances only; the
/// opening balance is not a period outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IterationSummary {
    /// Lowest closing balance
    pub min_cash: f64,
    /// Highest closing balance
    pub max_cash: f64,
    /// Balance after the last period
    pub final_cash: f64,
    /// True if any period closed with a shortfall
    pub has_shortfall: bool,
    /// Largest single-period shortfall
    pub max_shortfall: f64,
    /// Number of periods closing with a shortfall
    pub shortfall_periods: usize,
    /// Longest run of consecutive shortfall periods
    pub longest_shortfall_run: usize,
}

/// Incrementally builds an [`IterationSummary`] from closing balances.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SummaryAccumulator {
    summary: IterationSummary,
    current_run: usize,
    observed: usize,
}

impl SummaryAccumulator {
    pub(crate) fn new(initial_cash: f64) -> Self {
        Self {
            summary: IterationSummary {
                min_cash: f64::INFINITY,
                max_cash: f64::NEG_INFINITY,
                final_cash: initial_cash,
                ..IterationSummary::default()
            },
            current_run: 0,
            observed: 0,
        }
    }

    #[inline]
    pub(crate) fn observe(&mut self, balance: f64) {
        let s = &mut self.summary;
        self.observed += 1;
        s.min_cash = s.min_cash.min(balance);
        s.max_cash = s.max_cash.max(balance);
        s.final_cash = balance;

        let shortfall = (-balance).max(0.0);
        if shortfall > 0.0 {
            s.has_shortfall = true;
            s.max_shortfall = s.max_shortfall.max(shortfall);
            s.shortfall_periods += 1;
            self.current_run += 1;
            s.longest_shortfall_run = s.longest_shortfall_run.max(self.current_run);
        } else {
            self.current_run = 0;
        }
    }

    pub(crate) fn finish(self) -> IterationSummary {
        let mut summary = self.summary;
        if self.observed == 0 {
            summary.min_cash = summary.final_cash;
            summary.max_cash = summary.final_cash;
        }
        summary
    }
}

/// One complete simulated path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IterationResult {
    /// Iteration index, also the seed offset
    pub index: usize,
    /// Sampled value of every variable
    pub variables: VariableValues,
    /// One outcome per period, in order
    pub periods: Vec<PeriodOutcome>,
    /// Path summary
    pub summary: IterationSummary,
}

impl IterationResult {
    /// Drops the per-period path, keeping what analysis needs.
    pub fn into_record(self) -> IterationRecord {
        IterationRecord {
            index: self.index,
            variables: self.variables,
            summary: self.summary,
        }
    }
}

/// Compact form of an [`IterationResult`] retained for the whole run.
///
/// The path can be re-derived from `variables` with
/// [`IterationRunner::replay`](super::IterationRunner::replay).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// Iteration index
    pub index: usize,
    /// Sampled value of every variable
    pub variables: VariableValues,
    /// Path summary
    pub summary: IterationSummary,
}
