//! Descriptive statistics, percentile tables, shortfall analysis and
//! convergence diagnostics over the collected iterations.

use crate::runner::{IterationRecord, IterationSummary};
use cashflow_core::math::{describe, mean, percentile, population_std_dev, sorted, Statistics};
use serde::{Deserialize, Serialize};

/// Number of cumulative batches used by the convergence diagnostic.
pub const CONVERGENCE_BATCHES: usize = 10;

/// Convergence rate below which a run is considered converged.
pub const CONVERGENCE_THRESHOLD: f64 = 0.01;

/// Per-iteration metrics tracked by the analyzer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedMetric {
    /// Balance after the last period
    FinalCash,
    /// Lowest closing balance
    MinCash,
    /// Largest single-period shortfall
    MaxShortfall,
    /// Number of shortfall periods
    ShortfallPeriods,
}

impl TrackedMetric {
    /// Every tracked metric.
    pub const ALL: [TrackedMetric; 4] = [
        TrackedMetric::FinalCash,
        TrackedMetric::MinCash,
        TrackedMetric::MaxShortfall,
        TrackedMetric::ShortfallPeriods,
    ];

    /// Reads this metric from a summary.
    #[inline]
    pub fn extract(self, summary: &IterationSummary) -> f64 {
        match self {
            TrackedMetric::FinalCash => summary.final_cash,
            TrackedMetric::MinCash => summary.min_cash,
            TrackedMetric::MaxShortfall => summary.max_shortfall,
            TrackedMetric::ShortfallPeriods => summary.shortfall_periods as f64,
        }
    }
}

/// One value per [`TrackedMetric`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet<T> {
    /// Final cash
    pub final_cash: T,
    /// Minimum cash
    pub min_cash: T,
    /// Maximum shortfall
    pub max_shortfall: T,
    /// Shortfall periods
    pub shortfall_periods: T,
}

impl<T> MetricSet<T> {
    /// Builds a set by evaluating `f` for each metric.
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(TrackedMetric) -> T,
    {
        Self {
            final_cash: f(TrackedMetric::FinalCash),
            min_cash: f(TrackedMetric::MinCash),
            max_shortfall: f(TrackedMetric::MaxShortfall),
            shortfall_periods: f(TrackedMetric::ShortfallPeriods),
        }
    }

    /// Value for `metric`.
    pub fn get(&self, metric: TrackedMetric) -> &T {
        match metric {
            TrackedMetric::FinalCash => &self.final_cash,
            TrackedMetric::MinCash => &self.min_cash,
            TrackedMetric::MaxShortfall => &self.max_shortfall,
            TrackedMetric::ShortfallPeriods => &self.shortfall_periods,
        }
    }
}

/// Value of a metric at one confidence level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PercentilePoint {
    /// Probability in (0, 1)
    pub level: f64,
    /// Percentile value
    pub value: f64,
}

/// Shortfall distribution across iterations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortfallAnalysis {
    /// Fraction of iterations with at least one shortfall period
    pub probability: f64,
    /// Mean maximum shortfall over the shortfall iterations, 0 if none
    pub average_shortfall: f64,
    /// Mean number of shortfall periods per iteration
    pub expected_shortfall_periods: f64,
    /// Fraction of iterations in shortfall at each period
    pub by_period: Vec<f64>,
}

/// Batch-mean stability of `final_cash`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceDiagnostic {
    /// `convergence_rate < 0.01`
    pub is_converged: bool,
    /// Dispersion of cumulative batch means relative to their mean
    pub convergence_rate: f64,
    /// `1 - convergence_rate`
    pub stability_index: f64,
    /// Running mean at each batch boundary
    pub batch_means: Vec<f64>,
}

/// Computes statistics over the iteration records of one run.
///
/// Records must be in iteration-index order; the convergence diagnostic
/// depends on it.
#[derive(Clone, Debug)]
pub struct StatisticalAnalyzer {
    samples: MetricSet<Vec<f64>>,
    shortfall_flags: Vec<bool>,
}

impl StatisticalAnalyzer {
    /// Extracts every tracked metric from `records`.
    pub fn new(records: &[IterationRecord]) -> Self {
        Self {
            samples: MetricSet::from_fn(|metric| {
                records.iter().map(|r| metric.extract(&r.summary)).collect()
            }),
            shortfall_flags: records.iter().map(|r| r.summary.has_shortfall).collect(),
        }
    }

    /// Raw values of `metric` in iteration order.
    pub fn samples(&self, metric: TrackedMetric) -> &[f64] {
        self.samples.get(metric)
    }

    /// Descriptive statistics for every metric.
    pub fn metric_statistics(&self) -> MetricSet<Statistics> {
        MetricSet::from_fn(|metric| describe(self.samples(metric)))
    }

    /// Percentile table for every metric at the requested levels.
    pub fn percentile_tables(&self, levels: &[f64]) -> MetricSet<Vec<PercentilePoint>> {
        MetricSet::from_fn(|metric| {
            let ordered = sorted(self.samples(metric));
            levels
                .iter()
                .map(|&level| PercentilePoint {
                    level,
                    value: percentile(&ordered, level),
                })
                .collect()
        })
    }

    /// Shortfall probability and magnitude.
    ///
    /// `by_period` comes from the period aggregator and is passed through.
    pub fn shortfall_analysis(&self, by_period: Vec<f64>) -> ShortfallAnalysis {
        let n = self.shortfall_flags.len();
        if n == 0 {
            return ShortfallAnalysis {
                by_period,
                ..ShortfallAnalysis::default()
            };
        }

        let shortfalls: Vec<f64> = self
            .samples(TrackedMetric::MaxShortfall)
            .iter()
            .zip(&self.shortfall_flags)
            .filter(|(_, flag)| **flag)
            .map(|(value, _)| *value)
            .collect();

        ShortfallAnalysis {
            probability: shortfalls.len() as f64 / n as f64,
            average_shortfall: mean(&shortfalls),
            expected_shortfall_periods: mean(self.samples(TrackedMetric::ShortfallPeriods)),
            by_period,
        }
    }

    /// Convergence of the running mean of `final_cash` over ten cumulative
    /// batches.
    ///
    /// The rate divides the dispersion of the batch means by the absolute
    /// value of their mean. A zero mean gives rate 0 when the batch means
    /// agree and 1 otherwise.
    pub fn convergence(&self) -> ConvergenceDiagnostic {
        let values = self.samples(TrackedMetric::FinalCash);
        let n = values.len();

        let mut batch_means = Vec::with_capacity(CONVERGENCE_BATCHES);
        let mut sum = 0.0;
        let mut consumed = 0;
        for batch in 1..=CONVERGENCE_BATCHES {
            let end = batch * n / CONVERGENCE_BATCHES;
            if end == 0 {
                continue;
            }
            sum += values[consumed..end].iter().sum::<f64>();
            consumed = end;
            batch_means.push(sum / end as f64);
        }

        let centre = mean(&batch_means).abs();
        let spread = population_std_dev(&batch_means);
        let convergence_rate = if centre > 0.0 {
            spread / centre
        } else if spread > 0.0 {
            1.0
        } else {
            0.0
        };

        ConvergenceDiagnostic {
            is_converged: convergence_rate < CONVERGENCE_THRESHOLD,
            convergence_rate,
            stability_index: 1.0 - convergence_rate,
            batch_means,
        }
    }
}
