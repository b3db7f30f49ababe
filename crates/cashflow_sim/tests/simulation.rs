//! End-to-end simulation runs through the public API.

use approx::assert_relative_eq;
use cashflow_core::distributions::{CustomTransform, Distribution, DistributionError, VariableSpec};
use cashflow_sim::analysis::SimulationWarning;
use cashflow_sim::config::{ScheduledAmount, TaxPolicy};
use cashflow_sim::model::{
    CustomPaymentPatterns, PaymentPatternProvider, STANDARD_COLLECTION_PATTERN,
    STANDARD_PAYMENT_PATTERN,
};
use cashflow_sim::{
    run_simulation, run_simulation_with, CancellationToken, ConfigError, EngineSettings,
    SimulationConfig, SimulationEngine, SimulationError,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Routes engine events to the test output; repeated calls are no-ops.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("cashflow_sim=debug"))
        .with_test_writer()
        .try_init();
}

fn normal(name: &str, mean: f64, std_dev: f64) -> VariableSpec {
    VariableSpec::new(name, Distribution::Normal { mean, std_dev })
}

fn mixed_config(seed: u64) -> SimulationConfig {
    SimulationConfig::builder()
        .iterations(2_000)
        .horizon(12)
        .initial_cash(3_000.0)
        .variable(normal("revenue", 10_000.0, 2_000.0))
        .variable(VariableSpec::new(
            "operating_expenses",
            Distribution::Triangular {
                min: 7_000.0,
                mode: 9_500.0,
                max: 13_000.0,
            },
        ))
        .variable(VariableSpec::new(
            "dso",
            Distribution::Uniform {
                min: 0.0,
                max: 75.0,
            },
        ))
        .variable(normal("receivables", 4_000.0, 500.0))
        .correlation("revenue", "receivables", 0.4)
        .capex(6, 5_000.0)
        .tax(TaxPolicy::with_rate(0.2))
        .seed(seed)
        .build()
        .unwrap()
}

#[test]
fn test_seeded_runs_are_identical() {
    let config = mixed_config(2024);
    let first = run_simulation(&config).unwrap();
    let second = run_simulation(&config).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.metadata.seed, 2024);
    assert!(first.metadata.correlated);
    assert!(first.metadata.warnings.is_empty());
}

#[test]
fn test_correlation_on_non_shock_families_is_reported() {
    init_tracing();
    let config = SimulationConfig::builder()
        .iterations(300)
        .horizon(6)
        .initial_cash(10_000.0)
        .variable(VariableSpec::new(
            "revenue",
            Distribution::Triangular {
                min: 4_000.0,
                mode: 5_000.0,
                max: 6_500.0,
            },
        ))
        .variable(VariableSpec::new(
            "operating_expenses",
            Distribution::Uniform {
                min: 3_500.0,
                max: 5_000.0,
            },
        ))
        .correlation("revenue", "operating_expenses", 0.9)
        .seed(21)
        .build()
        .unwrap();
    let result = run_simulation(&config).unwrap();

    assert!(!result.metadata.correlated);
    assert_eq!(
        result.metadata.warnings,
        vec![SimulationWarning::CorrelationIgnored {
            first: "revenue".to_string(),
            second: "operating_expenses".to_string(),
        }]
    );
}

#[test]
fn test_different_seeds_differ() {
    let a = run_simulation(&mixed_config(1)).unwrap();
    let b = run_simulation(&mixed_config(2)).unwrap();
    assert_ne!(a.statistics.final_cash.mean, b.statistics.final_cash.mean);
}

#[test]
fn test_revenue_only_scenario() {
    let config = SimulationConfig::builder()
        .iterations(5_000)
        .horizon(12)
        .initial_cash(0.0)
        .variable(normal("revenue", 10_000.0, 1_000.0))
        .seed(7)
        .build()
        .unwrap();
    let result = run_simulation(&config).unwrap();

    assert_eq!(result.risk.probability_of_ruin, 0.0);
    assert_eq!(result.shortfall.probability, 0.0);
    let p50 = result
        .percentiles
        .final_cash
        .iter()
        .find(|point| point.level == 0.5)
        .unwrap()
        .value;
    assert_relative_eq!(p50, 120_000.0, max_relative = 0.1);
}

#[test]
fn test_expense_only_scenario_always_ruins() {
    let config = SimulationConfig::builder()
        .iterations(500)
        .horizon(6)
        .initial_cash(1_000.0)
        .variable(normal("operating_expenses", 5_000.0, 0.0))
        .seed(3)
        .build()
        .unwrap();
    let result = run_simulation(&config).unwrap();

    assert_eq!(result.risk.probability_of_ruin, 1.0);
    assert_eq!(result.shortfall.probability, 1.0);
    assert_relative_eq!(result.statistics.final_cash.mean, 1_000.0 - 30_000.0);
    assert_relative_eq!(result.statistics.min_cash.mean, -29_000.0);
    assert_eq!(result.risk.liquidity.max_shortfall_duration, 6);
    assert_relative_eq!(result.risk.liquidity.shortfall_frequency, 1.0);
    assert_relative_eq!(result.risk.liquidity.score, 60.0);
}

#[test]
fn test_stress_tests_move_in_the_expected_direction() {
    let result = run_simulation(&mixed_config(99)).unwrap();
    let stress = &result.risk.stress_tests;
    assert_eq!(stress.len(), 3);

    let revenue_down = stress
        .iter()
        .find(|s| s.scenario == "revenue_down_20")
        .unwrap();
    assert!(revenue_down.mean_final_cash_delta <= 0.0);
    assert_relative_eq!(
        revenue_down.base_mean_final_cash,
        result.statistics.final_cash.mean,
        max_relative = 1e-9
    );

    for scenario in stress {
        assert!(scenario.mean_final_cash_delta <= 0.0, "{}", scenario.scenario);
        assert!(scenario.shortfall_probability >= result.shortfall.probability);
    }
}

#[test]
fn test_report_shape() {
    let result = run_simulation(&mixed_config(5)).unwrap();

    assert_eq!(result.statistics.final_cash.count, 2_000);
    assert_eq!(result.shortfall.by_period.len(), 12);
    assert_eq!(result.scenarios.confidence_bands.len(), 12);
    assert_eq!(result.scenarios.best.periods.len(), 12);
    assert_eq!(result.convergence.batch_means.len(), 10);
    assert_eq!(result.risk.tail_risk.len(), 3);

    for band in &result.scenarios.confidence_bands {
        assert!(band.p05 <= band.p25 && band.p25 <= band.p50);
        assert!(band.p50 <= band.p75 && band.p75 <= band.p95);
    }
    for tail in &result.risk.tail_risk {
        assert!(tail.conditional_value_at_risk <= tail.value_at_risk);
    }
    assert!(result.scenarios.worst.final_cash <= result.scenarios.median.final_cash);
    assert!(result.scenarios.median.final_cash <= result.scenarios.best.final_cash);
    assert_eq!(
        result.scenarios.best.periods.last().unwrap().balance,
        result.scenarios.best.final_cash
    );
}

#[test]
fn test_beta_budget_exhaustion_is_fatal() {
    let config = SimulationConfig::builder()
        .iterations(100)
        .horizon(3)
        .variable(VariableSpec::new(
            "tax_rate",
            Distribution::Beta {
                alpha: 400.0,
                beta: 400.0,
                min: 0.0,
                max: 1.0,
            },
        ))
        .max_rejection_attempts(20)
        .seed(1)
        .build()
        .unwrap();
    assert!(matches!(
        run_simulation(&config),
        Err(SimulationError::Sampling(_))
    ));
}

#[test]
fn test_overflowing_lognormal_aborts_run() {
    let config = SimulationConfig::builder()
        .iterations(50)
        .horizon(3)
        .variable(VariableSpec::new(
            "revenue",
            Distribution::Lognormal {
                mean: 800.0,
                std_dev: 0.1,
            },
        ))
        .seed(1)
        .build()
        .unwrap();
    match run_simulation(&config) {
        Err(SimulationError::Sampling(DistributionError::NonFiniteSample { variable, .. })) => {
            assert_eq!(variable, "revenue");
        }
        other => panic!("expected a sampling error, got {:?}", other.map(|r| r.metadata)),
    }
}

#[test]
fn test_nan_custom_transform_aborts_run() {
    let config = SimulationConfig::builder()
        .iterations(200)
        .horizon(3)
        .initial_cash(100.0)
        .variable(VariableSpec::new(
            "revenue",
            Distribution::Custom(CustomTransform::new("root", |z| 1_000.0 * z.sqrt())),
        ))
        .seed(6)
        .build()
        .unwrap();
    assert!(matches!(
        run_simulation(&config),
        Err(SimulationError::Sampling(DistributionError::NonFiniteSample { .. }))
    ));
}

#[test]
fn test_validation_errors_are_classified() {
    let bad_distribution = SimulationConfig::builder()
        .horizon(3)
        .variable(normal("revenue", 1.0, -1.0))
        .build();
    assert!(matches!(
        bad_distribution,
        Err(SimulationError::InvalidDistributionParameters(_))
    ));

    let bad_correlation = SimulationConfig::builder()
        .horizon(3)
        .variable(normal("revenue", 1.0, 1.0))
        .correlation("revenue", "missing", 0.5)
        .build();
    assert!(matches!(
        bad_correlation,
        Err(SimulationError::InvalidCorrelationSpec(_))
    ));

    let out_of_range = SimulationConfig::builder()
        .horizon(3)
        .variable(normal("revenue", 1.0, 1.0))
        .variable(normal("operating_expenses", 1.0, 1.0))
        .correlation("revenue", "operating_expenses", 1.5)
        .build();
    assert!(matches!(
        out_of_range,
        Err(SimulationError::InvalidCorrelationSpec(_))
    ));

    let no_iterations = SimulationConfig::builder().iterations(0).horizon(3).build();
    assert_eq!(
        no_iterations.unwrap_err(),
        SimulationError::InvalidConfig(ConfigError::InvalidIterationCount(0))
    );
}

#[test]
fn test_inconsistent_correlations_warn_but_run() {
    init_tracing();
    let config = SimulationConfig::builder()
        .iterations(300)
        .horizon(6)
        .initial_cash(10_000.0)
        .variable(normal("revenue", 5_000.0, 500.0))
        .variable(normal("operating_expenses", 4_000.0, 400.0))
        .variable(normal("receivables", 1_000.0, 100.0))
        .correlation("revenue", "operating_expenses", 0.9)
        .correlation("revenue", "receivables", 0.9)
        .correlation("operating_expenses", "receivables", -0.9)
        .seed(8)
        .build()
        .unwrap();
    let result = run_simulation(&config).unwrap();
    assert!(result
        .metadata
        .warnings
        .contains(&SimulationWarning::CorrelationMatrixNotPositiveSemiDefinite));
}

/// Standard curves that cancel the run after a fixed number of lookups.
struct CancellingPatterns {
    token: CancellationToken,
    calls: AtomicUsize,
    limit: usize,
}

impl PaymentPatternProvider for CancellingPatterns {
    fn collection_pattern(&self) -> &[f64] {
        if self.calls.fetch_add(1, Ordering::Relaxed) + 1 >= self.limit {
            self.token.cancel();
        }
        &STANDARD_COLLECTION_PATTERN
    }

    fn payment_pattern(&self) -> &[f64] {
        &STANDARD_PAYMENT_PATTERN
    }
}

#[test]
fn test_cancellation_mid_run() {
    init_tracing();
    let token = CancellationToken::new();
    let patterns = CancellingPatterns {
        token: token.clone(),
        calls: AtomicUsize::new(0),
        limit: 12 * 50,
    };
    let config = SimulationConfig::builder()
        .iterations(10_000)
        .horizon(12)
        .variable(normal("revenue", 1_000.0, 100.0))
        .seed(4)
        .build()
        .unwrap();
    let engine = SimulationEngine::new(
        EngineSettings::default()
            .with_worker_threads(2)
            .with_chunk_size(16),
    )
    .with_patterns(patterns)
    .with_cancellation(token.clone());

    match engine.run(&config) {
        Err(SimulationError::Cancelled {
            completed,
            requested,
        }) => {
            assert_eq!(requested, 10_000);
            assert!(completed < requested);
        }
        other => panic!("expected cancellation, got {:?}", other.map(|r| r.metadata)),
    }
    assert!(token.is_cancelled());
}

#[test]
fn test_custom_patterns_and_tax_schedule() {
    let config = SimulationConfig::builder()
        .iterations(200)
        .horizon(4)
        .initial_cash(0.0)
        .variable(normal("receivables", 1_000.0, 0.0))
        .tax(TaxPolicy::scheduled(vec![
            ScheduledAmount::new(1, 100.0),
            ScheduledAmount::new(3, 50.0),
        ]))
        .seed(12)
        .build()
        .unwrap();

    // Nothing settles in the first period.
    let patterns = CustomPaymentPatterns::new(vec![0.0, 1.0], vec![1.0]).unwrap();
    let result = run_simulation_with(&config, patterns).unwrap();
    let path = &result.scenarios.median.periods;

    assert_relative_eq!(path[0].cash_flow, 0.0);
    assert_relative_eq!(path[1].cash_flow, 1_000.0 - 100.0);
    assert_relative_eq!(path[2].cash_flow, 1_000.0);
    assert_relative_eq!(path[3].cash_flow, 1_000.0 - 50.0);
    assert_relative_eq!(result.statistics.final_cash.mean, 2_850.0);
}

#[test]
fn test_toml_file_round_trip() {
    let path = std::env::temp_dir().join(format!("cashflow_sim_{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
        iterations = 400
        horizon = 6
        initial_cash = 1000.0
        seed = 17

        [[variables]]
        name = "operating_expenses"
        type = "normal"
        mean = 5000.0
        std_dev = 0.0
        "#,
    )
    .unwrap();

    let loaded = SimulationConfig::from_file(&path);
    std::fs::remove_file(&path).unwrap();
    let config = loaded.unwrap();

    assert_eq!(config.iterations(), 400);
    assert_eq!(config.seed(), Some(17));
    let result = run_simulation(&config).unwrap();
    assert_eq!(result.risk.probability_of_ruin, 1.0);

    let missing =
        SimulationConfig::from_file(std::env::temp_dir().join("cashflow_sim_missing.toml"));
    assert!(matches!(
        missing,
        Err(SimulationError::InvalidConfig(ConfigError::File(_)))
    ));
}

#[test]
fn test_result_serialises_to_json() {
    let result = run_simulation(&mixed_config(77)).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["metadata"]["seed"], 77);
    assert_eq!(json["metadata"]["band_backend"], "exact");
    assert!(json["risk"]["stress_tests"].is_array());
    assert!(json["statistics"]["final_cash"]["mean"].is_number());
}
