//! Hybrid strategy: genetic exploration handing its best point to
//! gradient-descent refinement.

use async_trait::async_trait;
use bes_types::{BesResult, Termination};
use rand::rngs::StdRng;
use tracing::debug;

use crate::genetic::GeneticOptimizer;
use crate::gradient::GradientDescentOptimizer;
use crate::strategy::{OptimizerStrategy, RunContext, StrategyOutcome};

/// Fraction of the iteration budget spent on the genetic phase.
const GENETIC_SHARE: f64 = 0.7;
const GRADIENT_SHARE: f64 = 0.3;

/// Composite optimizer owning one genetic and one gradient-descent strategy.
///
/// Runs ⌊0.7·n⌋ genetic generations, seeds the gradient phase with the
/// genetic best, and runs ⌊0.3·n⌋ gradient iterations. The combined trace is
/// exactly the concatenation of both phases, with continuous iteration
/// numbering.
///
/// Each phase tracks its own running best, and the gradient phase re-scores
/// its seed fresh. Under a noisy evaluator the re-score can land below the
/// genetic phase's recorded best, so `best_score` may dip once at the phase
/// boundary; within each phase the series stays non-decreasing, and the
/// final result still takes the better of the two phase bests.
pub struct HybridOptimizer {
    genetic: GeneticOptimizer,
    gradient: GradientDescentOptimizer,
}

impl HybridOptimizer {
    pub fn new(population_size: usize, learning_rate: f64, rng: StdRng) -> Self {
        Self {
            genetic: GeneticOptimizer::new(population_size, rng),
            gradient: GradientDescentOptimizer::new(learning_rate),
        }
    }
}

#[async_trait]
impl OptimizerStrategy for HybridOptimizer {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    async fn run(&mut self, ctx: &mut RunContext<'_>) -> BesResult<StrategyOutcome> {
        let genetic_budget = (GENETIC_SHARE * ctx.max_iterations as f64).floor() as usize;
        let gradient_budget = (GRADIENT_SHARE * ctx.max_iterations as f64).floor() as usize;
        debug!(genetic_budget, gradient_budget, "hybrid phase split");

        let genetic_outcome = {
            let mut phase_ctx = RunContext {
                evaluator: ctx.evaluator,
                aggregator: ctx.aggregator,
                space: ctx.space,
                base: ctx.base,
                max_iterations: genetic_budget,
                convergence_threshold: ctx.convergence_threshold,
                cancel: ctx.cancel,
                progress: &mut *ctx.progress,
                iteration_offset: ctx.iteration_offset,
            };
            self.genetic.run(&mut phase_ctx).await?
        };

        if genetic_outcome.termination == Termination::Cancelled {
            return Ok(genetic_outcome);
        }

        // The gradient phase refines from the genetic best; fall back to the
        // base configuration if the genetic phase had no budget to evaluate.
        let seed = if genetic_outcome.best_fitness.is_finite() {
            genetic_outcome.best_configuration.clone()
        } else {
            ctx.base.clone()
        };

        let gradient_outcome = {
            let mut phase_ctx = RunContext {
                evaluator: ctx.evaluator,
                aggregator: ctx.aggregator,
                space: ctx.space,
                base: &seed,
                max_iterations: gradient_budget,
                convergence_threshold: ctx.convergence_threshold,
                cancel: ctx.cancel,
                progress: &mut *ctx.progress,
                iteration_offset: ctx.iteration_offset + genetic_outcome.steps.len(),
            };
            self.gradient.run(&mut phase_ctx).await?
        };

        let mut steps = genetic_outcome.steps;
        steps.extend(gradient_outcome.steps);

        // Strict improvement keeps the genetic result on ties.
        let (best_configuration, best_fitness) =
            if gradient_outcome.best_fitness > genetic_outcome.best_fitness {
                (
                    gradient_outcome.best_configuration,
                    gradient_outcome.best_fitness,
                )
            } else {
                (
                    genetic_outcome.best_configuration,
                    genetic_outcome.best_fitness,
                )
            };

        Ok(StrategyOutcome {
            best_configuration,
            best_fitness,
            steps,
            termination: gradient_outcome.termination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::CancelToken;
    use crate::testutil::{base_config, drive_strategy, NoisyQuadraticEvaluator, QuadraticEvaluator};
    use rand::SeedableRng;

    fn optimizer(seed: u64) -> HybridOptimizer {
        HybridOptimizer::new(6, 0.1, StdRng::seed_from_u64(seed))
    }

    #[tokio::test]
    async fn trace_is_exactly_both_phases_concatenated() {
        let mut hybrid = optimizer(5);
        let base = base_config();
        let token = CancelToken::new();
        let evaluator = NoisyQuadraticEvaluator::new(0.15, 77);
        // Budget 10 → 7 genetic generations + 3 gradient iterations, and the
        // noisy landscape never satisfies either convergence window.
        let outcome = drive_strategy(&mut hybrid, &evaluator, &base, 10, 0.0, &token).await;

        assert_eq!(outcome.steps.len(), 10);
        let iterations: Vec<usize> = outcome.steps.iter().map(|s| s.iteration).collect();
        assert_eq!(iterations, (1..=10).collect::<Vec<_>>());
        // Gradient phase carries no population diversity.
        assert!(outcome.steps[6].diversity.is_some());
        assert!(outcome.steps[7].diversity.is_none());
    }

    // Noise-free on purpose: with a noisy evaluator the gradient phase's
    // fresh re-score of its seed may dip below the genetic best once at the
    // boundary (see the type-level docs).
    #[tokio::test]
    async fn running_best_survives_the_phase_boundary() {
        let mut hybrid = optimizer(9);
        let base = base_config();
        let token = CancelToken::new();
        let evaluator = QuadraticEvaluator::default();
        let outcome = drive_strategy(&mut hybrid, &evaluator, &base, 20, 0.0, &token).await;

        let genetic_best = outcome.steps[13].best_score; // last genetic step
        assert!(outcome.best_fitness >= genetic_best);
        for pair in outcome.steps.windows(2) {
            assert!(pair[1].best_score >= pair[0].best_score);
        }
    }

    #[tokio::test]
    async fn cancellation_during_genetic_phase_skips_gradient() {
        let mut hybrid = optimizer(3);
        let base = base_config();
        let token = CancelToken::new();
        token.cancel();
        let outcome =
            drive_strategy(&mut hybrid, &QuadraticEvaluator::default(), &base, 50, 0.0, &token)
                .await;
        assert_eq!(outcome.termination, Termination::Cancelled);
        assert!(outcome.steps.is_empty());
    }
}
