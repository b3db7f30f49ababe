//! Single-path execution.

use super::result::{IterationResult, IterationSummary, PeriodOutcome, SummaryAccumulator};
use crate::model::{CashFlowModel, Drivers, VariableValues};
use cashflow_core::correlation::CorrelationEngine;
use cashflow_core::distributions::{DistributionError, Sampler};
use cashflow_core::rng::SimRng;

/// Runs one iteration at a time against shared read-only state.
///
/// Holds no mutable state, so one runner is shared by every worker thread.
/// Each call owns its generator, seeded from the base seed and the
/// iteration index.
///
/// # Examples
///
/// ```
/// use cashflow_core::correlation::CorrelationEngine;
/// use cashflow_core::distributions::{Distribution, Sampler, VariableSpec};
/// use cashflow_sim::model::{CashFlowModel, StandardPaymentPatterns};
/// use cashflow_sim::runner::IterationRunner;
/// use cashflow_sim::SimulationConfig;
///
/// let config = SimulationConfig::builder()
///     .horizon(3)
///     .variable(VariableSpec::new("revenue", Distribution::Uniform { min: 90.0, max: 110.0 }))
///     .build()
///     .unwrap();
/// let correlation = CorrelationEngine::build(&config.variable_names(), config.correlations()).unwrap();
/// let model = CashFlowModel::new(&config, &StandardPaymentPatterns);
/// let runner = IterationRunner::new(model, &correlation, Sampler::default());
///
/// let result = runner.run(0, 42).unwrap();
/// assert_eq!(result.periods.len(), 3);
/// assert!(result.summary.final_cash > 0.0);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct IterationRunner<'a> {
    model: CashFlowModel<'a>,
    correlation: &'a CorrelationEngine,
    sampler: Sampler,
}

impl<'a> IterationRunner<'a> {
    /// Creates a runner.
    pub fn new(
        model: CashFlowModel<'a>,
        correlation: &'a CorrelationEngine,
        sampler: Sampler,
    ) -> Self {
        Self {
            model,
            correlation,
            sampler,
        }
    }

    /// Runs iteration `index` with generator seed `base_seed + index`.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionError::Sampling`] when a beta draw exhausts
    /// its rejection budget, or [`DistributionError::NonFiniteSample`] when a
    /// draw is NaN or infinite.
    pub fn run(&self, index: usize, base_seed: u64) -> Result<IterationResult, DistributionError> {
        let mut rng = SimRng::for_iteration(base_seed, index);
        let variables = self.sample(&mut rng)?;
        Ok(self.replay(index, variables))
    }

    /// Re-derives the full path from already-sampled variables.
    ///
    /// Deterministic: replaying the variables of an earlier run yields the
    /// same periods and summary.
    pub fn replay(&self, index: usize, variables: VariableValues) -> IterationResult {
        let drivers = Drivers::from_values(&variables);
        let periods = self.accumulate(&drivers);
        let summary = Self::summarise(self.model.config().initial_cash(), &periods);
        IterationResult {
            index,
            variables,
            periods,
            summary,
        }
    }

    /// Summary for `drivers` without materialising the path.
    pub fn summary_for(&self, drivers: &Drivers) -> IterationSummary {
        let config = self.model.config();
        let mut acc = SummaryAccumulator::new(config.initial_cash());
        let mut balance = config.initial_cash();
        for period in 0..config.horizon() {
            balance += self.model.period_cash_flow(drivers, period);
            acc.observe(balance);
        }
        acc.finish()
    }

    /// Draws correlated shocks, then every variable in configuration order.
    fn sample(&self, rng: &mut SimRng) -> Result<VariableValues, DistributionError> {
        let specs = self.model.config().variables();
        let mut shocks = vec![0.0; specs.len()];
        self.correlation.draw_shocks(rng, &mut shocks);

        let mut values = VariableValues::new();
        for (spec, shock) in specs.iter().zip(shocks) {
            let shock = spec.distribution.uses_shock().then_some(shock);
            let value = self.sampler.sample(spec, shock, rng)?;
            values.insert(spec.name.clone(), value);
        }
        Ok(values)
    }

    /// Walks the horizon accumulating the balance.
    fn accumulate(&self, drivers: &Drivers) -> Vec<PeriodOutcome> {
        let config = self.model.config();
        let mut balance = config.initial_cash();
        (0..config.horizon())
            .map(|period| {
                let cash_flow = self.model.period_cash_flow(drivers, period);
                balance += cash_flow;
                PeriodOutcome {
                    period,
                    cash_flow,
                    balance,
                    shortfall: (-balance).max(0.0),
                }
            })
            .collect()
    }

    fn summarise(initial_cash: f64, periods: &[PeriodOutcome]) -> IterationSummary {
        let mut acc = SummaryAccumulator::new(initial_cash);
        for outcome in periods {
            acc.observe(outcome.balance);
        }
        acc.finish()
    }
}
