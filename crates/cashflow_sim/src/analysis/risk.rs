//! Tail-risk metrics over minimum cash and shortfalls.

use super::stress::StressTestResult;
use crate::runner::IterationRecord;
use cashflow_core::math::{mean, percentile_index, sorted};
use serde::{Deserialize, Serialize};

/// Tail probabilities at which VaR and CVaR are reported.
pub const VAR_LEVELS: [f64; 3] = [0.01, 0.05, 0.10];

/// Cap on the liquidity risk score.
pub const MAX_LIQUIDITY_SCORE: f64 = 100.0;

/// VaR and CVaR of minimum cash at one tail probability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TailRisk {
    /// Tail probability
    pub level: f64,
    /// Minimum-cash percentile at `level`
    pub value_at_risk: f64,
    /// Mean minimum cash at or below the VaR index
    pub conditional_value_at_risk: f64,
}

/// Liquidity risk score and supporting duration metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRisk {
    /// `min(100, mean(shortfall_periods) * 10)`
    pub score: f64,
    /// Longest consecutive shortfall run in any iteration
    pub max_shortfall_duration: usize,
    /// Mean longest run over iterations with a shortfall, 0 if none
    pub average_shortfall_duration: f64,
    /// Shortfall periods over all simulated periods
    pub shortfall_frequency: f64,
}

/// Aggregate risk metrics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// VaR/CVaR at 1%, 5% and 10%
    pub tail_risk: Vec<TailRisk>,
    /// Mean maximum shortfall over shortfall iterations, 0 if none
    pub expected_shortfall: f64,
    /// Fraction of iterations whose minimum cash is at or below zero
    pub probability_of_ruin: f64,
    /// Liquidity risk
    pub liquidity: LiquidityRisk,
    /// Stress scenario outcomes
    pub stress_tests: Vec<StressTestResult>,
}

impl RiskMetrics {
    /// Tail risk at `level`, if it was computed.
    pub fn at_level(&self, level: f64) -> Option<&TailRisk> {
        self.tail_risk.iter().find(|t| (t.level - level).abs() < 1e-12)
    }
}

/// Computes [`RiskMetrics`] from iteration records.
#[derive(Clone, Copy, Debug)]
pub struct RiskMetricsCalculator<'a> {
    records: &'a [IterationRecord],
    horizon: usize,
}

impl<'a> RiskMetricsCalculator<'a> {
    /// Creates a calculator over `records` simulated for `horizon` periods.
    pub fn new(records: &'a [IterationRecord], horizon: usize) -> Self {
        Self { records, horizon }
    }

    /// All metrics except stress tests, which are attached by the caller.
    pub fn calculate(&self, stress_tests: Vec<StressTestResult>) -> RiskMetrics {
        RiskMetrics {
            tail_risk: self.tail_risk(&VAR_LEVELS),
            expected_shortfall: self.expected_shortfall(),
            probability_of_ruin: self.probability_of_ruin(),
            liquidity: self.liquidity(),
            stress_tests,
        }
    }

    /// VaR and CVaR of minimum cash at each level.
    ///
    /// CVaR averages every value at or below the VaR index; an empty tail
    /// falls back to the worst observation.
    pub fn tail_risk(&self, levels: &[f64]) -> Vec<TailRisk> {
        let min_cash: Vec<f64> = self.records.iter().map(|r| r.summary.min_cash).collect();
        let ordered = sorted(&min_cash);
        let worst = ordered.first().copied().unwrap_or(0.0);

        levels
            .iter()
            .map(|&level| {
                let idx = percentile_index(level, ordered.len());
                let tail = ordered.get(..=idx).unwrap_or(&[]);
                let value_at_risk = ordered.get(idx).copied().unwrap_or(0.0);
                let conditional_value_at_risk = if tail.is_empty() { worst } else { mean(tail) };
                TailRisk {
                    level,
                    value_at_risk,
                    conditional_value_at_risk,
                }
            })
            .collect()
    }

    /// Mean maximum shortfall over iterations that had one.
    pub fn expected_shortfall(&self) -> f64 {
        let shortfalls: Vec<f64> = self
            .records
            .iter()
            .filter(|r| r.summary.has_shortfall)
            .map(|r| r.summary.max_shortfall)
            .collect();
        mean(&shortfalls)
    }

    /// Fraction of iterations with `min_cash <= 0`.
    pub fn probability_of_ruin(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let ruined = self
            .records
            .iter()
            .filter(|r| r.summary.min_cash <= 0.0)
            .count();
        ruined as f64 / self.records.len() as f64
    }

    /// Liquidity score and shortfall durations.
    pub fn liquidity(&self) -> LiquidityRisk {
        if self.records.is_empty() {
            return LiquidityRisk::default();
        }
        let periods: Vec<f64> = self
            .records
            .iter()
            .map(|r| r.summary.shortfall_periods as f64)
            .collect();
        let runs: Vec<f64> = self
            .records
            .iter()
            .filter(|r| r.summary.has_shortfall)
            .map(|r| r.summary.longest_shortfall_run as f64)
            .collect();
        let cells = (self.records.len() * self.horizon) as f64;

        LiquidityRisk {
            score: (mean(&periods) * 10.0).min(MAX_LIQUIDITY_SCORE),
            max_shortfall_duration: self
                .records
                .iter()
                .map(|r| r.summary.longest_shortfall_run)
                .max()
                .unwrap_or(0),
            average_shortfall_duration: mean(&runs),
            shortfall_frequency: if cells > 0.0 {
                periods.iter().sum::<f64>() / cells
            } else {
                0.0
            },
        }
    }
}
