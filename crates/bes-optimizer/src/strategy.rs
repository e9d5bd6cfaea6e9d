//! The strategy seam: a common `run` capability over interchangeable search
//! strategies, plus the shared run context and cancellation token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bes_types::{
    BesResult, Configuration, Evaluator, ParameterSpace, Termination, TunableParam,
};

use crate::fitness::FitnessAggregator;
use crate::progress::ProgressSink;

/// Cooperative cancellation flag, cloneable across tasks.
///
/// Advisory only: strategies check it once at the top of each iteration, so
/// an in-flight evaluation batch always completes before the flag is
/// honored.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Everything a strategy needs for one run, borrowed from the controller.
pub struct RunContext<'a> {
    pub evaluator: &'a dyn Evaluator,
    pub aggregator: &'a FitnessAggregator,
    pub space: &'a ParameterSpace,
    /// Starting configuration; descriptors are carried through unchanged.
    pub base: &'a Configuration,
    pub max_iterations: usize,
    pub convergence_threshold: f64,
    pub cancel: &'a CancelToken,
    pub progress: &'a mut dyn ProgressSink,
    /// Added to every emitted iteration number; the hybrid composite uses
    /// it so its second phase continues the first phase's numbering.
    pub iteration_offset: usize,
}

/// What a strategy hands back when its loop exits.
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    /// Best configuration seen across the run. Equal to the base
    /// configuration when the run was cancelled before any evaluation, in
    /// which case `best_fitness` is `-inf`.
    pub best_configuration: Configuration,
    pub best_fitness: f64,
    pub steps: Vec<bes_types::OptimizationStep>,
    pub termination: Termination,
}

/// A search strategy: iteratively explores the parameter space to maximize
/// aggregated fitness, streaming one step per iteration.
#[async_trait]
pub trait OptimizerStrategy: Send {
    /// Strategy tag, e.g. `"genetic"`.
    fn name(&self) -> &'static str;

    async fn run(&mut self, ctx: &mut RunContext<'_>) -> BesResult<StrategyOutcome>;
}

/// Root-mean of per-parameter variance across a population.
///
/// Used both as telemetry and as the stagnation signal: a collapsing swarm
/// or population drives this toward zero.
pub(crate) fn diversity(population: &[Configuration]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let n = population.len() as f64;
    let mut variance_sum = 0.0;
    for param in TunableParam::ALL {
        let mean = population
            .iter()
            .map(|c| c.parameters.get(param))
            .sum::<f64>()
            / n;
        let variance = population
            .iter()
            .map(|c| {
                let d = c.parameters.get(param) - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        variance_sum += variance;
    }
    (variance_sum / TunableParam::ALL.len() as f64).sqrt()
}
