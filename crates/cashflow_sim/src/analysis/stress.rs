//! Deterministic stress scenarios over already-sampled iterations.
//!
//! Each scenario scales the sampled revenue and operating expenses of every
//! iteration and replays the period model. Nothing is re-sampled, so a
//! stressed run is directly comparable with the base run.

use crate::model::Drivers;
use crate::runner::{IterationRecord, IterationRunner};
use cashflow_core::math::mean;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A fixed shock to revenue and operating expenses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StressScenario {
    /// Scenario identifier
    pub name: &'static str,
    /// Multiplier applied to revenue
    pub revenue_factor: f64,
    /// Multiplier applied to operating expenses
    pub expense_factor: f64,
}

/// Revenue −20%, expenses +15%, and a combined −15% / +10%.
pub const STANDARD_STRESS_SCENARIOS: [StressScenario; 3] = [
    StressScenario {
        name: "revenue_down_20",
        revenue_factor: 0.80,
        expense_factor: 1.00,
    },
    StressScenario {
        name: "expenses_up_15",
        revenue_factor: 1.00,
        expense_factor: 1.15,
    },
    StressScenario {
        name: "combined_revenue_down_15_expenses_up_10",
        revenue_factor: 0.85,
        expense_factor: 1.10,
    },
];

/// Outcome of one stress scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StressTestResult {
    /// Scenario identifier
    pub scenario: String,
    /// Multiplier applied to revenue
    pub revenue_factor: f64,
    /// Multiplier applied to operating expenses
    pub expense_factor: f64,
    /// Mean final cash of the base run
    pub base_mean_final_cash: f64,
    /// Mean final cash under stress
    pub stressed_mean_final_cash: f64,
    /// `stressed_mean_final_cash - base_mean_final_cash`
    pub mean_final_cash_delta: f64,
    /// Fraction of stressed iterations with a shortfall
    pub shortfall_probability: f64,
}

/// Runs `scenarios` against `records`.
///
/// Replays are independent per iteration and run on the current rayon
/// pool; the reduction is sequential in index order, so results do not
/// depend on the thread count.
pub fn run_stress_tests(
    runner: &IterationRunner<'_>,
    records: &[IterationRecord],
    scenarios: &[StressScenario],
) -> Vec<StressTestResult> {
    let base_finals: Vec<f64> = records.iter().map(|r| r.summary.final_cash).collect();
    let base_mean_final_cash = mean(&base_finals);

    scenarios
        .iter()
        .map(|scenario| {
            let stressed: Vec<(f64, bool)> = records
                .par_iter()
                .map(|record| {
                    let drivers = Drivers::from_values(&record.variables)
                        .stressed(scenario.revenue_factor, scenario.expense_factor);
                    let summary = runner.summary_for(&drivers);
                    (summary.final_cash, summary.has_shortfall)
                })
                .collect();

            let finals: Vec<f64> = stressed.iter().map(|(cash, _)| *cash).collect();
            let stressed_mean_final_cash = mean(&finals);
            let shortfall_probability = if stressed.is_empty() {
                0.0
            } else {
                stressed.iter().filter(|(_, s)| *s).count() as f64 / stressed.len() as f64
            };

            StressTestResult {
                scenario: scenario.name.to_string(),
                revenue_factor: scenario.revenue_factor,
                expense_factor: scenario.expense_factor,
                base_mean_final_cash,
                stressed_mean_final_cash,
                mean_final_cash_delta: stressed_mean_final_cash - base_mean_final_cash,
                shortfall_probability,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CashFlowModel, StandardPaymentPatterns, VariableValues};
    use crate::SimulationConfig;
    use approx::assert_relative_eq;
    use cashflow_core::correlation::CorrelationEngine;
    use cashflow_core::distributions::{Distribution, Sampler, VariableSpec};

    #[test]
    fn test_revenue_and_expense_shocks() {
        let config = SimulationConfig::builder()
            .horizon(10)
            .initial_cash(500.0)
            .variable(VariableSpec::new(
                "revenue",
                Distribution::Uniform { min: 900.0, max: 1_100.0 },
            ))
            .variable(VariableSpec::new(
                "operating_expenses",
                Distribution::Uniform { min: 850.0, max: 950.0 },
            ))
            .build()
            .unwrap();
        let correlation =
            CorrelationEngine::build(&config.variable_names(), config.correlations()).unwrap();
        let model = CashFlowModel::new(&config, &StandardPaymentPatterns);
        let runner = IterationRunner::new(model, &correlation, Sampler::default());

        let mut variables = VariableValues::new();
        variables.insert("revenue".to_string(), 1_000.0);
        variables.insert("operating_expenses".to_string(), 900.0);
        let records = vec![runner.replay(0, variables).into_record()];
        assert_eq!(records[0].summary.final_cash, 1_500.0);

        let results = run_stress_tests(&runner, &records, &STANDARD_STRESS_SCENARIOS);
        assert_eq!(results.len(), 3);

        // 10 periods of -200 revenue
        assert_relative_eq!(results[0].mean_final_cash_delta, -2_000.0, epsilon = 1e-6);
        // 10 periods of +135 expenses
        assert_relative_eq!(results[1].mean_final_cash_delta, -1_350.0, epsilon = 1e-6);
        // 10 periods of -150 revenue and +90 expenses
        assert_relative_eq!(results[2].mean_final_cash_delta, -2_400.0, epsilon = 1e-6);

        // Stressed revenue 800 against 900 of expenses runs out of cash
        assert_eq!(results[0].shortfall_probability, 1.0);
        assert_eq!(results[0].base_mean_final_cash, 1_500.0);
    }

    #[test]
    fn test_no_records() {
        let config = SimulationConfig::builder().horizon(3).build().unwrap();
        let correlation = CorrelationEngine::build::<&str>(&[], &[]).unwrap();
        let model = CashFlowModel::new(&config, &StandardPaymentPatterns);
        let runner = IterationRunner::new(model, &correlation, Sampler::default());

        let results = run_stress_tests(&runner, &[], &STANDARD_STRESS_SCENARIOS);
        assert!(results.iter().all(|r| r.mean_final_cash_delta == 0.0));
        assert!(results.iter().all(|r| r.shortfall_probability == 0.0));
    }
}
