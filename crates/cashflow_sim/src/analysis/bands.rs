//! Per-period confidence bands and shortfall counts.
//!
//! Fed one path at a time during the run so that only the current chunk of
//! full paths has to be alive at once.

use crate::config::BandBackend;
use crate::runner::PeriodOutcome;
use cashflow_core::math::{percentile, sort_in_place, P2Quantile};
use serde::{Deserialize, Serialize};

/// Probabilities reported for each band.
pub const BAND_LEVELS: [f64; 5] = [0.05, 0.25, 0.50, 0.75, 0.95];

/// Cross-iteration distribution of the closing balance at one period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    /// Zero-based period index
    pub period: usize,
    /// 5th percentile
    pub p05: f64,
    /// 25th percentile
    pub p25: f64,
    /// Median
    pub p50: f64,
    /// 75th percentile
    pub p75: f64,
    /// 95th percentile
    pub p95: f64,
}

impl ConfidenceBand {
    fn from_levels(period: usize, q: [f64; 5]) -> Self {
        Self {
            period,
            p05: q[0],
            p25: q[1],
            p50: q[2],
            p75: q[3],
            p95: q[4],
        }
    }
}

#[derive(Clone, Debug)]
enum BandStore {
    Exact(Vec<Vec<f64>>),
    Streaming(Vec<[P2Quantile; 5]>),
}

/// Accumulates balances and shortfall counts per period.
#[derive(Clone, Debug)]
pub struct PeriodAggregator {
    store: BandStore,
    shortfall_counts: Vec<usize>,
    observed: usize,
}

impl PeriodAggregator {
    /// Creates an aggregator for `horizon` periods.
    ///
    /// `backend` must already be resolved; `Auto` is treated as `Exact`.
    /// `expected_iterations` only sizes the exact store up front.
    pub fn new(backend: BandBackend, horizon: usize, expected_iterations: usize) -> Self {
        let store = match backend {
            BandBackend::Streaming => BandStore::Streaming(
                (0..horizon)
                    .map(|_| BAND_LEVELS.map(P2Quantile::new))
                    .collect(),
            ),
            BandBackend::Exact | BandBackend::Auto => BandStore::Exact(
                (0..horizon)
                    .map(|_| Vec::with_capacity(expected_iterations))
                    .collect(),
            ),
        };
        Self {
            store,
            shortfall_counts: vec![0; horizon],
            observed: 0,
        }
    }

    /// Number of paths observed.
    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Adds one path.
    pub fn observe(&mut self, periods: &[PeriodOutcome]) {
        self.observed += 1;
        for (count, outcome) in self.shortfall_counts.iter_mut().zip(periods) {
            if outcome.shortfall > 0.0 {
                *count += 1;
            }
        }
        match &mut self.store {
            BandStore::Exact(columns) => {
                for (column, outcome) in columns.iter_mut().zip(periods) {
                    column.push(outcome.balance);
                }
            }
            BandStore::Streaming(estimators) => {
                for (markers, outcome) in estimators.iter_mut().zip(periods) {
                    for q in markers.iter_mut() {
                        q.observe(outcome.balance);
                    }
                }
            }
        }
    }

    /// Fraction of paths with a shortfall at each period.
    pub fn shortfall_by_period(&self) -> Vec<f64> {
        if self.observed == 0 {
            return vec![0.0; self.shortfall_counts.len()];
        }
        let n = self.observed as f64;
        self.shortfall_counts.iter().map(|c| *c as f64 / n).collect()
    }

    /// Consumes the aggregator and returns one band per period.
    pub fn into_bands(self) -> Vec<ConfidenceBand> {
        match self.store {
            BandStore::Exact(columns) => columns
                .into_iter()
                .enumerate()
                .map(|(period, mut column)| {
                    sort_in_place(&mut column);
                    ConfidenceBand::from_levels(period, BAND_LEVELS.map(|p| percentile(&column, p)))
                })
                .collect(),
            BandStore::Streaming(estimators) => estimators
                .into_iter()
                .enumerate()
                .map(|(period, markers)| {
                    ConfidenceBand::from_levels(period, markers.map(|q| q.estimate()))
                })
                .collect(),
        }
    }
}
