//! Representative paths for visualisation.

use super::bands::ConfidenceBand;
use crate::runner::{IterationRecord, IterationRunner, PeriodOutcome};
use cashflow_core::math::{percentile, sorted};
use serde::{Deserialize, Serialize};

/// Final-cash percentile of the "best" path.
pub const BEST_PERCENTILE: f64 = 0.95;
/// Final-cash percentile of the "median" path.
pub const MEDIAN_PERCENTILE: f64 = 0.50;
/// Final-cash percentile of the "worst" path.
pub const WORST_PERCENTILE: f64 = 0.05;

/// One full path re-derived from an iteration's variables.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPath {
    /// Index of the selected iteration
    pub iteration: usize,
    /// Its final cash
    pub final_cash: f64,
    /// Its per-period outcomes
    pub periods: Vec<PeriodOutcome>,
}

/// Best, median and worst paths plus per-period bands.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPaths {
    /// Path nearest the 95th final-cash percentile
    pub best: ScenarioPath,
    /// Path nearest the median
    pub median: ScenarioPath,
    /// Path nearest the 5th percentile
    pub worst: ScenarioPath,
    /// Closing-balance bands per period
    pub confidence_bands: Vec<ConfidenceBand>,
}

/// Picks representative iterations and replays their paths.
#[derive(Clone, Copy, Debug)]
pub struct ScenarioPathSelector<'r, 'a> {
    runner: &'r IterationRunner<'a>,
}

impl<'r, 'a> ScenarioPathSelector<'r, 'a> {
    /// Creates a selector replaying through `runner`.
    pub fn new(runner: &'r IterationRunner<'a>) -> Self {
        Self { runner }
    }

    /// Selects best/median/worst from `records` and attaches `bands`.
    ///
    /// Empty input yields default (empty) paths.
    pub fn select(&self, records: &[IterationRecord], bands: Vec<ConfidenceBand>) -> ScenarioPaths {
        let finals: Vec<f64> = records.iter().map(|r| r.summary.final_cash).collect();
        let ordered = sorted(&finals);

        let pick = |p: f64| -> ScenarioPath {
            nearest(records, percentile(&ordered, p))
                .map(|record| {
                    let replayed = self.runner.replay(record.index, record.variables.clone());
                    ScenarioPath {
                        iteration: record.index,
                        final_cash: replayed.summary.final_cash,
                        periods: replayed.periods,
                    }
                })
                .unwrap_or_default()
        };

        ScenarioPaths {
            best: pick(BEST_PERCENTILE),
            median: pick(MEDIAN_PERCENTILE),
            worst: pick(WORST_PERCENTILE),
            confidence_bands: bands,
        }
    }
}

/// First record, in index order, whose final cash is closest to `target`.
pub fn nearest(records: &[IterationRecord], target: f64) -> Option<&IterationRecord> {
    let mut best: Option<(&IterationRecord, f64)> = None;
    for record in records {
        let distance = (record.summary.final_cash - target).abs();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((record, distance)),
        }
    }
    best.map(|(record, _)| record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CashFlowModel, StandardPaymentPatterns, VariableValues};
    use crate::runner::IterationSummary;
    use crate::SimulationConfig;
    use cashflow_core::correlation::CorrelationEngine;
    use cashflow_core::distributions::Sampler;

    fn record(index: usize, final_cash: f64) -> IterationRecord {
        IterationRecord {
            index,
            variables: VariableValues::new(),
            summary: IterationSummary {
                final_cash,
                ..IterationSummary::default()
            },
        }
    }

    #[test]
    fn test_nearest_first_match_wins() {
        let records = vec![record(0, 10.0), record(1, 30.0), record(2, 10.0), record(3, 20.0)];
        assert_eq!(nearest(&records, 10.0).map(|r| r.index), Some(0));
        assert_eq!(nearest(&records, 25.0).map(|r| r.index), Some(1));
        assert_eq!(nearest(&records, 19.0).map(|r| r.index), Some(3));
        assert!(nearest(&[], 0.0).is_none());
    }

    #[test]
    fn test_select_replays_paths() {
        let config = SimulationConfig::builder().horizon(4).build().unwrap();
        let correlation = CorrelationEngine::build::<&str>(&[], &[]).unwrap();
        let model = CashFlowModel::new(&config, &StandardPaymentPatterns);
        let runner = IterationRunner::new(model, &correlation, Sampler::default());

        let records: Vec<IterationRecord> = (0..20)
            .map(|i| {
                let mut variables = VariableValues::new();
                variables.insert("revenue".to_string(), i as f64);
                runner.replay(i, variables).into_record()
            })
            .collect();

        let paths = ScenarioPathSelector::new(&runner).select(&records, Vec::new());
        // Final cash is 4 * revenue: 0, 4, ..., 76
        assert_eq!(paths.best.iteration, 18);
        assert_eq!(paths.median.iteration, 9);
        assert_eq!(paths.worst.iteration, 0);
        assert_eq!(paths.best.periods.len(), 4);
        assert_eq!(paths.best.final_cash, 72.0);
        assert_eq!(paths.best.periods[3].balance, 72.0);
    }

    #[test]
    fn test_select_empty() {
        let config = SimulationConfig::builder().horizon(4).build().unwrap();
        let correlation = CorrelationEngine::build::<&str>(&[], &[]).unwrap();
        let model = CashFlowModel::new(&config, &StandardPaymentPatterns);
        let runner = IterationRunner::new(model, &correlation, Sampler::default());

        let paths = ScenarioPathSelector::new(&runner).select(&[], Vec::new());
        assert_eq!(paths, ScenarioPaths::default());
    }
}
