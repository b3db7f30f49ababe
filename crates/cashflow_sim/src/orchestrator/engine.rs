//! Parallel simulation engine.

use super::cancel::CancellationToken;
use crate::analysis::{
    run_stress_tests, AnalysisResult, PeriodAggregator, RiskMetricsCalculator, RunMetadata,
    ScenarioPathSelector, SimulationWarning, StatisticalAnalyzer, STANDARD_STRESS_SCENARIOS,
};
use crate::config::{BandBackend, ConfigError, EngineSettings, SimulationConfig};
use crate::error::SimulationError;
use crate::model::{CashFlowModel, PaymentPatternProvider, StandardPaymentPatterns};
use crate::runner::{IterationRecord, IterationResult, IterationRunner};
use cashflow_core::correlation::CorrelationEngine;
use cashflow_core::distributions::{DistributionError, Sampler};
use cashflow_core::rng::entropy_seed;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs simulations on a dedicated rayon pool.
///
/// Iterations are processed in chunks of [`EngineSettings::chunk_size`]:
/// each chunk runs in parallel, then its paths are folded into the band
/// aggregator in index order and reduced to compact records. Only one
/// chunk of full paths is alive at a time.
///
/// # Examples
///
/// ```
/// use cashflow_core::distributions::{Distribution, VariableSpec};
/// use cashflow_sim::{EngineSettings, SimulationConfig, SimulationEngine};
///
/// let config = SimulationConfig::builder()
///     .iterations(500)
///     .horizon(12)
///     .initial_cash(5_000.0)
///     .variable(VariableSpec::new("revenue", Distribution::Normal { mean: 1_000.0, std_dev: 100.0 }))
///     .variable(VariableSpec::new("operating_expenses", Distribution::Uniform { min: 800.0, max: 1_200.0 }))
///     .seed(11)
///     .build()
///     .unwrap();
///
/// let engine = SimulationEngine::new(EngineSettings::default().with_worker_threads(2));
/// let result = engine.run(&config).unwrap();
/// assert_eq!(result.metadata.iterations, 500);
/// assert_eq!(result.metadata.seed, 11);
/// ```
#[derive(Clone)]
pub struct SimulationEngine {
    settings: EngineSettings,
    patterns: Arc<dyn PaymentPatternProvider>,
    cancellation: CancellationToken,
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl std::fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("settings", &self.settings)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

impl SimulationEngine {
    /// Creates an engine with standard payment patterns.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            patterns: Arc::new(StandardPaymentPatterns),
            cancellation: CancellationToken::new(),
        }
    }

    /// Replaces the settlement curves.
    pub fn with_patterns<P>(mut self, patterns: P) -> Self
    where
        P: PaymentPatternProvider + 'static,
    {
        self.patterns = Arc::new(patterns);
        self
    }

    /// Uses `token` for cancellation.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Execution settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// A clone of the cancellation token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Runs `config` to completion.
    ///
    /// # Errors
    ///
    /// - Validation errors from the configuration or settings, before any
    ///   sampling
    /// - `Sampling` if any iteration exhausts its rejection budget
    /// - `Cancelled` if the token is triggered before the last chunk ends
    pub fn run(&self, config: &SimulationConfig) -> Result<AnalysisResult, SimulationError> {
        config.validate()?;
        self.settings.validate()?;
        let started = Instant::now();

        let correlation =
            CorrelationEngine::build(&config.variable_names(), config.correlations())?;
        let mut warnings = Vec::new();
        if correlation.is_degraded() {
            warn!(
                pairs = config.correlations().len(),
                "Correlation matrix is not positive semi-definite; clamped Cholesky factor in use"
            );
            warnings.push(SimulationWarning::CorrelationMatrixNotPositiveSemiDefinite);
        }
        for pair in config.inert_correlations() {
            warn!(
                first = %pair.first,
                second = %pair.second,
                "Correlation ignored; only normal, lognormal and custom variables use shocks"
            );
            warnings.push(SimulationWarning::CorrelationIgnored {
                first: pair.first.clone(),
                second: pair.second.clone(),
            });
        }
        let correlated = correlation.is_correlated() && config.has_effective_correlation();

        let iterations = config.iterations();
        let horizon = config.horizon();
        let backend = self.settings.band_backend.resolve(iterations, horizon);
        if backend == BandBackend::Streaming {
            let cells = iterations.saturating_mul(horizon);
            if self.settings.band_backend == BandBackend::Auto {
                warn!(cells, "Falling back to streaming confidence bands");
            }
            warnings.push(SimulationWarning::StreamingBands { cells });
        }

        let seed = config.seed().unwrap_or_else(entropy_seed);
        info!(
            iterations,
            horizon,
            variables = config.variables().len(),
            seed,
            correlated,
            band_backend = %backend,
            worker_threads = self.settings.worker_threads,
            "Starting simulation"
        );

        let model = CashFlowModel::new(config, self.patterns.as_ref());
        let runner = IterationRunner::new(
            model,
            &correlation,
            Sampler::new(config.max_rejection_attempts()),
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.worker_threads)
            .build()
            .map_err(|e| ConfigError::WorkerPool(e.to_string()))?;

        let result = pool.install(|| {
            let (records, aggregator) = self.execute(&runner, iterations, horizon, seed, backend)?;
            Ok::<_, SimulationError>(analyse(
                &runner,
                config,
                records,
                aggregator,
                RunMetadata {
                    iterations,
                    horizon,
                    variables: config.variables().len(),
                    seed,
                    correlated,
                    band_backend: backend,
                    warnings,
                },
            ))
        })?;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            probability_of_ruin = result.risk.probability_of_ruin,
            mean_final_cash = result.statistics.final_cash.mean,
            converged = result.convergence.is_converged,
            "Simulation complete"
        );
        Ok(result)
    }

    /// Runs every iteration, chunk by chunk, in index order.
    fn execute(
        &self,
        runner: &IterationRunner<'_>,
        iterations: usize,
        horizon: usize,
        seed: u64,
        backend: BandBackend,
    ) -> Result<(Vec<IterationRecord>, PeriodAggregator), SimulationError> {
        let token = &self.cancellation;
        let chunk_size = self.settings.chunk_size;
        let mut records = Vec::with_capacity(iterations);
        let mut aggregator = PeriodAggregator::new(backend, horizon, iterations);

        for start in (0..iterations).step_by(chunk_size) {
            let end = (start + chunk_size).min(iterations);
            if token.is_cancelled() {
                return Err(cancelled(records.len(), iterations));
            }

            let chunk: Vec<Option<IterationResult>> = (start..end)
                .into_par_iter()
                .map(|index| {
                    if token.is_cancelled() {
                        Ok(None)
                    } else {
                        runner.run(index, seed).map(Some)
                    }
                })
                .collect::<Result<_, DistributionError>>()?;

            for result in chunk {
                let Some(result) = result else {
                    return Err(cancelled(records.len(), iterations));
                };
                aggregator.observe(&result.periods);
                records.push(result.into_record());
            }

            debug!(start, end, completed = records.len(), "Processed chunk");
        }

        Ok((records, aggregator))
    }
}

fn cancelled(completed: usize, requested: usize) -> SimulationError {
    warn!(completed, requested, "Simulation cancelled");
    SimulationError::Cancelled {
        completed,
        requested,
    }
}

/// Reduces the collected records into the final result.
fn analyse(
    runner: &IterationRunner<'_>,
    config: &SimulationConfig,
    records: Vec<IterationRecord>,
    aggregator: PeriodAggregator,
    metadata: RunMetadata,
) -> AnalysisResult {
    let analyzer = StatisticalAnalyzer::new(&records);
    let shortfall = analyzer.shortfall_analysis(aggregator.shortfall_by_period());
    let stress_tests = run_stress_tests(runner, &records, &STANDARD_STRESS_SCENARIOS);
    let risk = RiskMetricsCalculator::new(&records, config.horizon()).calculate(stress_tests);
    let scenarios = ScenarioPathSelector::new(runner).select(&records, aggregator.into_bands());

    AnalysisResult {
        statistics: analyzer.metric_statistics(),
        percentiles: analyzer.percentile_tables(config.confidence_levels()),
        shortfall,
        convergence: analyzer.convergence(),
        risk,
        scenarios,
        metadata,
    }
}
