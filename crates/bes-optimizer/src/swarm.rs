//! Particle swarm search with the standard constriction coefficients.

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

const INERTIA: f64 = 0.729;
const COGNITIVE: f64 = 1.494;
const SOCIAL: f64 = 1.494;
/// Initial velocities are drawn within ±10% of each dimension's range.
const INITIAL_VELOCITY_SPAN: f64 = 0.1;
const CONVERGENCE_WARMUP: usize = 10;
const CONVERGENCE_WINDOW: usize = 5;

struct Particle {
    position: Configuration,
    velocity: [f64; 5],
    best_position: Configuration,
    best_fitness: f64,
}

/// Particle swarm optimizer.
///
/// Velocity updates are synchronous: the whole swarm is evaluated first,
/// then every particle moves against the same global best. Positions are
/// clipped to bounds after each move; velocities are not clipped — that
/// asymmetry matches the reference behavior and is kept deliberately.
pub struct ParticleSwarmOptimizer {
    swarm_size: usize,
    rng: StdRng,
}

impl ParticleSwarmOptimizer {
    pub fn new(swarm_size: usize, rng: StdRng) -> Self {
        Self { swarm_size, rng }
    }

    fn init_swarm(&mut self, base: &Configuration, space: &ParameterSpace) -> Vec<Particle> {
        (0..self.swarm_size)
            .map(|_| {
                let position = base.redrawn(space, &mut self.rng);
                let mut velocity = [0.0; 5];
                for (slot, param) in velocity.iter_mut().zip(TunableParam::ALL) {
                    let span = INITIAL_VELOCITY_SPAN * space.range(param);
                    *slot = self.rng.random_range(-span..=span);
                }
                Particle {
                    best_position: position.clone(),
                    position,
                    velocity,
                    best_fitness: f64::NEG_INFINITY,
                }
            })
            .collect()
    }

    fn advance(
        &mut self,
        particle: &mut Particle,
        global_best: &Configuration,
        space: &ParameterSpace,
    ) {
        for (slot, param) in particle.velocity.iter_mut().zip(TunableParam::ALL) {
            let x = particle.position.parameters.get(param);
            let r1: f64 = self.rng.random();
            let r2: f64 = self.rng.random();
            let cognitive = COGNITIVE * r1 * (particle.best_position.parameters.get(param) - x);
            let social = SOCIAL * r2 * (global_best.parameters.get(param) - x);
            *slot = INERTIA * *slot + cognitive + social;
            let moved = space.clip(param, x + *slot);
            particle.position.parameters.set(param, moved);
        }
    }
}

#[async_trait]
impl OptimizerStrategy for ParticleSwarmOptimizer {
    fn name(&self) -> &'static str {
        "particle_swarm"
    }

    async fn run(&mut self, ctx: &mut RunContext<'_>) -> BesResult<StrategyOutcome> {
        let mut swarm = self.init_swarm(ctx.base, ctx.space);

        let mut global_best = ctx.base.clone();
        let mut global_fitness = f64::NEG_INFINITY;
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

            let positions: Vec<Configuration> =
                swarm.iter().map(|p| p.position.clone()).collect();
            let scores = ctx.aggregator.score_batch(ctx.evaluator, &positions).await?;

            // Strict improvement only, in index order: first index wins ties.
            for (particle, &score) in swarm.iter_mut().zip(&scores) {
                if score > particle.best_fitness {
                    particle.best_fitness = score;
                    particle.best_position = particle.position.clone();
                }
                if score > global_fitness {
                    global_fitness = score;
                    global_best = particle.position.clone();
                }
            }

            let average = scores.iter().sum::<f64>() / scores.len() as f64;
            let spread = diversity(&positions);
            debug!(
                iteration,
                best = global_fitness,
                average,
                diversity = spread,
                "swarm iteration evaluated"
            );

            let step = OptimizationStep {
                iteration: ctx.iteration_offset + iteration,
                best_score: global_fitness,
                average_score: average,
                diversity: Some(spread),
                parameter_snapshot: global_best.parameters,
                timestamp: Utc::now(),
            };
            ctx.progress.on_step(&step);
            steps.push(step);

            if monitor.record(global_fitness) {
                termination = Termination::Converged;
                break;
            }

            for particle in &mut swarm {
                self.advance(particle, &global_best, ctx.space);
            }
        }

        Ok(StrategyOutcome {
            best_configuration: global_best,
            best_fitness: global_fitness,
            steps,
            termination,
        })
    }
}
