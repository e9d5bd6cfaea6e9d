//! Genetic search: tournament selection, single-point crossover, bounded
//! mutation, elitism.

use async_trait::async_trait;
use bes_types::{
    BesResult, Configuration, OptimizationStep, ParameterSpace, Termination, TunableParam,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use crate::convergence::ConvergenceMonitor;
use crate::strategy::{diversity, OptimizerStrategy, RunContext, StrategyOutcome};

const ELITE_FRACTION: f64 = 0.1;
const CROSSOVER_RATE: f64 = 0.8;
const MUTATION_RATE: f64 = 0.1;
/// Mutation perturbs one key by up to ±10% of its declared range.
const MUTATION_SPAN: f64 = 0.1;
const TOURNAMENT_SIZE: usize = 3;
const CONVERGENCE_WARMUP: usize = 10;
const CONVERGENCE_WINDOW: usize = 5;

/// Population-based genetic optimizer.
///
/// Each generation the whole population is re-evaluated concurrently — no
/// fitness is cached across generations because the evaluator is noisy. The
/// running best only moves on strict improvement, so its series is
/// non-decreasing even when a generation's own best dips.
pub struct GeneticOptimizer {
    population_size: usize,
    rng: StdRng,
}

impl GeneticOptimizer {
    pub fn new(population_size: usize, rng: StdRng) -> Self {
        Self {
            population_size,
            rng,
        }
    }

    /// Breed the next generation: elites survive unchanged, the rest come
    /// from tournament-selected parents via crossover and mutation.
    fn reproduce(
        &mut self,
        population: &[Configuration],
        scores: &[f64],
        space: &ParameterSpace,
    ) -> Vec<Configuration> {
        let n = population.len();
        let elite_count = ((ELITE_FRACTION * n as f64).ceil() as usize).min(n);

        // Stable sort keeps equal-fitness ties resolved toward the first index.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut next = Vec::with_capacity(n);
        for &i in order.iter().take(elite_count) {
            next.push(population[i].clone());
        }

        while next.len() < n {
            let first = self.tournament(population, scores);
            let second = self.tournament(population, scores);
            let mut child = self.crossover(first, second);
            if self.rng.random::<f64>() < MUTATION_RATE {
                self.mutate(&mut child, space);
            }
            next.push(child);
        }
        next
    }

    /// k-way tournament: best of `TOURNAMENT_SIZE` uniform draws.
    fn tournament<'p>(
        &mut self,
        population: &'p [Configuration],
        scores: &[f64],
    ) -> &'p Configuration {
        let mut best = self.rng.random_range(0..population.len());
        for _ in 1..TOURNAMENT_SIZE {
            let challenger = self.rng.random_range(0..population.len());
            if scores[challenger] > scores[best] {
                best = challenger;
            }
        }
        &population[best]
    }

    /// Single-point crossover over the canonical parameter order: the child
    /// takes the first parent's prefix and the second parent's suffix.
    fn crossover(&mut self, first: &Configuration, second: &Configuration) -> Configuration {
        let mut child = first.clone();
        if self.rng.random::<f64>() < CROSSOVER_RATE {
            let point = self.rng.random_range(1..TunableParam::ALL.len());
            for &param in &TunableParam::ALL[point..] {
                child.parameters.set(param, second.parameters.get(param));
            }
        }
        child
    }

    /// Perturb one random key by up to ±10% of its range, clipped to bounds.
    fn mutate(&mut self, child: &mut Configuration, space: &ParameterSpace) {
        let param = TunableParam::ALL[self.rng.random_range(0..TunableParam::ALL.len())];
        let span = MUTATION_SPAN * space.range(param);
        let delta = self.rng.random_range(-span..=span);
        let value = space.clip(param, child.parameters.get(param) + delta);
        child.parameters.set(param, value);
    }
}

#[async_trait]
impl OptimizerStrategy for GeneticOptimizer {
    fn name(&self) -> &'static str {
        "genetic"
    }

    async fn run(&mut self, ctx: &mut RunContext<'_>) -> BesResult<StrategyOutcome> {
        let mut population: Vec<Configuration> = (0..self.population_size)
            .map(|_| ctx.base.redrawn(ctx.space, &mut self.rng))
            .collect();

        let mut best_configuration = ctx.base.clone();
        let mut best_fitness = f64::NEG_INFINITY;
        let mut monitor = ConvergenceMonitor::new(
            CONVERGENCE_WARMUP,
            CONVERGENCE_WINDOW,
            ctx.convergence_threshold,
        );
        let mut steps = Vec::new();
        let mut termination = Termination::MaxIterations;

        for generation in 1..=ctx.max_iterations {
            if ctx.cancel.is_cancelled() {
                termination = Termination::Cancelled;
                break;
            }

            let scores = ctx.aggregator.score_batch(ctx.evaluator, &population).await?;
            for (individual, &score) in population.iter().zip(&scores) {
                if score > best_fitness {
                    best_fitness = score;
                    best_configuration = individual.clone();
                }
            }

            let average = scores.iter().sum::<f64>() / scores.len() as f64;
            let spread = diversity(&population);
            debug!(
                generation,
                best = best_fitness,
                average,
                diversity = spread,
                "genetic generation evaluated"
            );

            let step = OptimizationStep {
                iteration: ctx.iteration_offset + generation,
                best_score: best_fitness,
                average_score: average,
                diversity: Some(spread),
                parameter_snapshot: best_configuration.parameters,
                timestamp: Utc::now(),
            };
            ctx.progress.on_step(&step);
            steps.push(step);

            if monitor.record(best_fitness) {
                termination = Termination::Converged;
                break;
            }

            population = self.reproduce(&population, &scores, ctx.space);
        }

        Ok(StrategyOutcome {
            best_configuration,
            best_fitness,
            steps,
            termination,
        })
    }
}
