//! Finite-difference gradient ascent on a single configuration.

use async_trait::async_trait;
use bes_types::{BesResult, OptimizationStep, Termination, TunableParam};
use chrono::Utc;
use tracing::debug;

use crate::convergence::ConvergenceMonitor;
use crate::strategy::{OptimizerStrategy, RunContext, StrategyOutcome};

/// Absolute probe offset for centered differences.
const EPSILON: f64 = 0.01;
const DECAY: f64 = 0.95;
const CONVERGENCE_WARMUP: usize = 5;
const CONVERGENCE_WINDOW: usize = 3;

/// Gradient-descent optimizer (ascent on fitness).
///
/// Each iteration estimates a centered finite-difference gradient for all
/// five tunables (two evaluator calls per parameter, issued concurrently),
/// then steps every parameter at once. The step is accepted even when the
/// new fitness does not beat the running best — on a noisy landscape a
/// rejected-looking step is often just noise — but the learning rate decays
/// by 5% on such iterations, so it is non-increasing across the run.
pub struct GradientDescentOptimizer {
    learning_rate: f64,
}

impl GradientDescentOptimizer {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }
}

#[async_trait]
impl OptimizerStrategy for GradientDescentOptimizer {
    fn name(&self) -> &'static str {
        "gradient_descent"
    }

    async fn run(&mut self, ctx: &mut RunContext<'_>) -> BesResult<StrategyOutcome> {
        let mut current = ctx.base.clone();
        let mut best_configuration = current.clone();
        let mut best_fitness = ctx.aggregator.score(ctx.evaluator, &current).await?;
        let mut monitor = ConvergenceMonitor::new(
            CONVERGENCE_WARMUP,
            CONVERGENCE_WINDOW,
            ctx.convergence_threshold,
        );
        let mut steps = Vec::new();
        let mut termination = Termination::MaxIterations;

        for iteration in 1..=ctx.max_iterations {
            if ctx.cancel.is_cancelled() {
                termination = Termination::Cancelled;
                break;
            }

            // Probe points are clipped so every configuration handed to the
            // evaluator stays in bounds; the denominator uses the applied
            // offsets, which only differ from 2ε on the boundary itself.
            let mut probes = Vec::with_capacity(TunableParam::ALL.len() * 2);
            let mut denominators = [0.0; 5];
            for (slot, param) in denominators.iter_mut().zip(TunableParam::ALL) {
                let value = current.parameters.get(param);
                let plus = ctx.space.clip(param, value + EPSILON);
                let minus = ctx.space.clip(param, value - EPSILON);
                *slot = plus - minus;

                let mut probe = current.clone();
                probe.parameters.set(param, plus);
                probes.push(probe);
                let mut probe = current.clone();
                probe.parameters.set(param, minus);
                probes.push(probe);
            }

            let probe_scores = ctx.aggregator.score_batch(ctx.evaluator, &probes).await?;
            for (i, param) in TunableParam::ALL.into_iter().enumerate() {
                let gradient = if denominators[i] > 0.0 {
                    (probe_scores[2 * i] - probe_scores[2 * i + 1]) / denominators[i]
                } else {
                    0.0
                };
                let value = current.parameters.get(param);
                let stepped = ctx.space.clip(param, value + self.learning_rate * gradient);
                current.parameters.set(param, stepped);
            }

            let fitness = ctx.aggregator.score(ctx.evaluator, &current).await?;
            if fitness > best_fitness {
                best_fitness = fitness;
                best_configuration = current.clone();
            } else {
                // No rollback: the step stands, only the pace slows.
                self.learning_rate *= DECAY;
            }

            debug!(
                iteration,
                fitness,
                best = best_fitness,
                learning_rate = self.learning_rate,
                "gradient iteration complete"
            );

            let step = OptimizationStep {
                iteration: ctx.iteration_offset + iteration,
                best_score: best_fitness,
                average_score: fitness,
                diversity: None,
                parameter_snapshot: best_configuration.parameters,
                timestamp: Utc::now(),
            };
            ctx.progress.on_step(&step);
            steps.push(step);

            if monitor.record(best_fitness) {
                termination = Termination::Converged;
                break;
            }
        }

        Ok(StrategyOutcome {
            best_configuration,
            best_fitness,
            steps,
            termination,
        })
    }
}
