//! Shared stub evaluators and run harnesses for the strategy tests.

use async_trait::async_trait;
use bes_types::{
    Configuration, Evaluator, EvaluatorError, EvaluatorResult, MetricKey, Objective,
    ParameterSpace, PerformanceMetrics,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::fitness::FitnessAggregator;
use crate::progress::NullSink;
use crate::strategy::{CancelToken, OptimizerStrategy, RunContext, StrategyOutcome};

pub(crate) fn base_config() -> Configuration {
    Configuration::new("test cell")
}

pub(crate) fn power_objective() -> Vec<Objective> {
    vec![Objective::maximize(MetricKey::PowerOutput, 1.0)]
}

fn only_power(power: f64) -> PerformanceMetrics {
    PerformanceMetrics {
        power_output: power,
        coulombic_efficiency: 0.0,
        stability_index: 0.0,
        lifespan_estimate: 0.0,
        material_cost: 0.0,
    }
}

/// Returns the same readings for every configuration.
pub(crate) struct ConstEvaluator(pub PerformanceMetrics);

impl ConstEvaluator {
    pub fn power_and_cost(power: f64, cost: f64) -> Self {
        let mut metrics = only_power(power);
        metrics.material_cost = cost;
        Self(metrics)
    }
}

#[async_trait]
impl Evaluator for ConstEvaluator {
    async fn evaluate(&self, _configuration: &Configuration) -> EvaluatorResult<PerformanceMetrics> {
        Ok(self.0)
    }
}

/// Noise-free `powerOutput = −(temperature − 30)²`; maximum at 30 °C.
#[derive(Default)]
pub(crate) struct QuadraticEvaluator;

#[async_trait]
impl Evaluator for QuadraticEvaluator {
    async fn evaluate(&self, configuration: &Configuration) -> EvaluatorResult<PerformanceMetrics> {
        let t = configuration.parameters.temperature;
        Ok(only_power(-((t - 30.0) * (t - 30.0))))
    }
}

/// Linear in temperature, constant in every other tunable.
pub(crate) struct LinearTemperatureEvaluator;

#[async_trait]
impl Evaluator for LinearTemperatureEvaluator {
    async fn evaluate(&self, configuration: &Configuration) -> EvaluatorResult<PerformanceMetrics> {
        Ok(only_power(3.0 * configuration.parameters.temperature))
    }
}

/// Always errors; exercises the abort-on-failure path.
pub(crate) struct FailingEvaluator;

#[async_trait]
impl Evaluator for FailingEvaluator {
    async fn evaluate(&self, _configuration: &Configuration) -> EvaluatorResult<PerformanceMetrics> {
        Err(EvaluatorError::Failed("stub failure".to_string()))
    }
}

/// Quadratic surface that yields to the scheduler on every call, so
/// single-threaded tests can interleave with an in-flight run.
pub(crate) struct YieldingEvaluator;

#[async_trait]
impl Evaluator for YieldingEvaluator {
    async fn evaluate(&self, configuration: &Configuration) -> EvaluatorResult<PerformanceMetrics> {
        tokio::task::yield_now().await;
        QuadraticEvaluator.evaluate(configuration).await
    }
}

/// Quadratic surface with seeded bounded multiplicative noise, mimicking the
/// real evaluator's ±15–20% characteristic.
pub(crate) struct NoisyQuadraticEvaluator {
    noise: f64,
    rng: Mutex<StdRng>,
}

impl NoisyQuadraticEvaluator {
    pub fn new(noise: f64, seed: u64) -> Self {
        Self {
            noise,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

#[async_trait]
impl Evaluator for NoisyQuadraticEvaluator {
    async fn evaluate(&self, configuration: &Configuration) -> EvaluatorResult<PerformanceMetrics> {
        let t = configuration.parameters.temperature;
        let clean = 100.0 - (t - 30.0) * (t - 30.0);
        let factor = 1.0 + self.rng.lock().random_range(-self.noise..=self.noise);
        Ok(only_power(clean * factor))
    }
}

/// Run a strategy with a default space, a pure power objective, and a null
/// progress sink.
pub(crate) async fn drive_strategy(
    strategy: &mut dyn OptimizerStrategy,
    evaluator: &dyn Evaluator,
    base: &Configuration,
    max_iterations: usize,
    convergence_threshold: f64,
    token: &CancelToken,
) -> StrategyOutcome {
    let aggregator = FitnessAggregator::new(power_objective()).unwrap();
    let space = ParameterSpace::default();
    let mut sink = NullSink;
    let mut ctx = RunContext {
        evaluator,
        aggregator: &aggregator,
        space: &space,
        base,
        max_iterations,
        convergence_threshold,
        cancel: token,
        progress: &mut sink,
        iteration_offset: 0,
    };
    strategy.run(&mut ctx).await.unwrap()
}
