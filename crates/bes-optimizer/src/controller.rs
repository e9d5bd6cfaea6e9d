//! Run orchestration: strategy selection, the single-active-run guard,
//! cancellation, and terminal result assembly.

use std::sync::Arc;
use std::time::Instant;

use bes_types::{
    Algorithm, BesError, BesResult, Configuration, Evaluator, OptimizationRequest,
    OptimizationResult, OptimizationStep, ParameterSpace,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::fitness::FitnessAggregator;
use crate::genetic::GeneticOptimizer;
use crate::gradient::GradientDescentOptimizer;
use crate::hybrid::HybridOptimizer;
use crate::progress::{ChannelSink, ProgressSink};
use crate::sensitivity::SensitivityAnalyzer;
use crate::strategy::{CancelToken, OptimizerStrategy, RunContext};
use crate::swarm::ParticleSwarmOptimizer;

/// Drives one optimization run at a time against a shared evaluator.
///
/// At most one run may be in flight per controller; a second concurrent
/// `run` call is rejected with [`BesError::RunInProgress`] rather than left
/// undefined. Cancellation is advisory: [`cancel`](Self::cancel) flips the
/// active run's token, which strategies honor at the next iteration
/// boundary after their in-flight evaluation batch completes.
pub struct OptimizationController {
    evaluator: Arc<dyn Evaluator>,
    space: ParameterSpace,
    active: Mutex<Option<CancelToken>>,
}

/// Clears the active-run slot when dropped, so a run future abandoned
/// mid-await (timeout, `select!`, `JoinHandle::abort`) releases the slot
/// instead of wedging every later run on `RunInProgress`.
struct ActiveRunGuard<'a> {
    slot: &'a Mutex<Option<CancelToken>>,
}

impl Drop for ActiveRunGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock() = None;
    }
}

impl OptimizationController {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            evaluator,
            space: ParameterSpace::default(),
            active: Mutex::new(None),
        }
    }

    pub fn with_space(mut self, space: ParameterSpace) -> Self {
        self.space = space;
        self
    }

    /// Request cancellation of the active run, if any.
    pub fn cancel(&self) {
        if let Some(token) = self.active.lock().as_ref() {
            token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Run a request to completion with a fresh cancellation token.
    pub async fn run(
        &self,
        request: &OptimizationRequest,
        base: &Configuration,
        progress: &mut dyn ProgressSink,
    ) -> BesResult<OptimizationResult> {
        self.run_with_token(request, base, CancelToken::new(), progress)
            .await
    }

    /// Spawn a run in the background: one step per iteration arrives on the
    /// returned stream, and the handle resolves to the terminal result.
    /// Cancel via [`cancel`](Self::cancel) on a retained controller handle.
    pub fn submit(
        self: Arc<Self>,
        request: OptimizationRequest,
        base: Configuration,
    ) -> (
        mpsc::UnboundedReceiver<OptimizationStep>,
        JoinHandle<BesResult<OptimizationResult>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut sink = ChannelSink::new(tx);
            self.run(&request, &base, &mut sink).await
        });
        (rx, handle)
    }

    /// Run a request with a caller-supplied token, so the caller can cancel
    /// from another task without going through the controller.
    pub async fn run_with_token(
        &self,
        request: &OptimizationRequest,
        base: &Configuration,
        token: CancelToken,
        progress: &mut dyn ProgressSink,
    ) -> BesResult<OptimizationResult> {
        request.validate().map_err(BesError::Request)?;
        if !request.constraints.is_empty() {
            warn!(
                count = request.constraints.len(),
                "request constraints are accepted but not enforced by any strategy"
            );
        }

        {
            let mut active = self.active.lock();
            if active.is_some() {
                return Err(BesError::RunInProgress);
            }
            *active = Some(token.clone());
        }

        let _guard = ActiveRunGuard { slot: &self.active };
        self.drive(request, base, &token, progress).await
    }

    async fn drive(
        &self,
        request: &OptimizationRequest,
        base: &Configuration,
        token: &CancelToken,
        progress: &mut dyn ProgressSink,
    ) -> BesResult<OptimizationResult> {
        let started = Instant::now();
        let aggregator = FitnessAggregator::new(request.objectives.clone())
            .map_err(BesError::Request)?;

        let baseline = aggregator.score(&*self.evaluator, base).await?;
        info!(
            algorithm = %request.algorithm,
            max_iterations = request.max_iterations,
            baseline,
            "starting optimization run"
        );

        let rng = match request.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut strategy: Box<dyn OptimizerStrategy> = match request.algorithm {
            Algorithm::Genetic => {
                Box::new(GeneticOptimizer::new(request.population_size(), rng))
            }
            Algorithm::Bayesian => {
                // Documented placeholder: no surrogate model exists, the
                // genetic strategy runs under the bayesian tag.
                warn!("bayesian mode delegates to the genetic strategy");
                Box::new(GeneticOptimizer::new(request.population_size(), rng))
            }
            Algorithm::ParticleSwarm => {
                Box::new(ParticleSwarmOptimizer::new(request.population_size(), rng))
            }
            Algorithm::GradientDescent => {
                Box::new(GradientDescentOptimizer::new(request.learning_rate()))
            }
            Algorithm::Hybrid => Box::new(HybridOptimizer::new(
                request.population_size(),
                request.learning_rate(),
                rng,
            )),
        };

        let mut ctx = RunContext {
            evaluator: &*self.evaluator,
            aggregator: &aggregator,
            space: &self.space,
            base,
            max_iterations: request.max_iterations,
            convergence_threshold: request.convergence_threshold,
            cancel: token,
            progress,
            iteration_offset: 0,
        };
        let outcome = strategy.run(&mut ctx).await?;

        // A run cancelled before its first evaluation has no best of its
        // own; fall back to the submitted configuration.
        let (optimal_configuration, best_fitness) = if outcome.best_fitness.is_finite() {
            (outcome.best_configuration, outcome.best_fitness)
        } else {
            (base.clone(), baseline)
        };

        let sensitivities = SensitivityAnalyzer
            .analyze(&aggregator, &*self.evaluator, &optimal_configuration, &self.space)
            .await?;

        let improvement = if baseline.abs() > f64::EPSILON {
            (best_fitness - baseline) / baseline.abs() * 100.0
        } else {
            0.0
        };

        let iterations = outcome.steps.len();
        info!(
            iterations,
            best_fitness,
            improvement,
            termination = ?outcome.termination,
            "optimization run finished"
        );

        Ok(OptimizationResult {
            algorithm: request.algorithm,
            optimal_configuration,
            baseline_fitness: baseline,
            best_fitness,
            improvement,
            convergence_data: outcome.steps,
            iterations,
            elapsed_ms: started.elapsed().as_millis() as u64,
            sensitivities,
            termination: outcome.termination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullSink;
    use crate::testutil::{
        base_config, power_objective, FailingEvaluator, NoisyQuadraticEvaluator,
        QuadraticEvaluator, YieldingEvaluator,
    };
    use bes_types::{MetricKey, Objective, RequestError, Termination};

    fn request(algorithm: Algorithm) -> OptimizationRequest {
        OptimizationRequest::new(algorithm, power_objective())
            .with_population_size(6)
            .with_seed(404)
    }

    fn controller(evaluator: impl Evaluator + 'static) -> OptimizationController {
        OptimizationController::new(Arc::new(evaluator))
    }

    #[tokio::test]
    async fn cancellation_before_start_yields_incomplete_result() {
        let ctl = controller(QuadraticEvaluator::default());
        let token = CancelToken::new();
        token.cancel();
        let result = ctl
            .run_with_token(
                &request(Algorithm::Genetic).with_max_iterations(50),
                &base_config(),
                token,
                &mut NullSink,
            )
            .await
            .unwrap();

        assert!(result.iterations <= 3);
        assert!(!result.completed());
        assert_eq!(result.termination, Termination::Cancelled);
        // Falls back to the submitted configuration and its baseline score.
        assert_eq!(result.best_fitness, result.baseline_fitness);
    }

    #[tokio::test]
    async fn progress_steps_are_forwarded_per_iteration() {
        let ctl = controller(NoisyQuadraticEvaluator::new(0.15, 12));
        let mut seen = Vec::new();
        let mut sink =
            crate::progress::FnSink::new(|step: &bes_types::OptimizationStep| {
                seen.push(step.iteration)
            });
        let result = ctl
            .run(
                &request(Algorithm::ParticleSwarm).with_max_iterations(8),
                &base_config(),
                &mut sink,
            )
            .await
            .unwrap();

        assert_eq!(result.iterations, 8);
        assert_eq!(seen, (1..=8).collect::<Vec<_>>());
        assert_eq!(result.convergence_data.len(), 8);
    }

    #[tokio::test]
    async fn bayesian_mode_keeps_its_tag() {
        let ctl = controller(QuadraticEvaluator::default());
        let result = ctl
            .run(
                &request(Algorithm::Bayesian).with_max_iterations(3),
                &base_config(),
                &mut NullSink,
            )
            .await
            .unwrap();
        assert_eq!(result.algorithm, Algorithm::Bayesian);
        assert_eq!(result.iterations, 3);
    }

    #[tokio::test]
    async fn evaluator_failure_aborts_the_run() {
        let ctl = controller(FailingEvaluator);
        let err = ctl
            .run(&request(Algorithm::Genetic), &base_config(), &mut NullSink)
            .await
            .unwrap_err();
        assert!(matches!(err, BesError::Evaluator(_)));
        assert!(!ctl.is_running());
    }

    #[tokio::test]
    async fn zero_sum_weights_are_rejected() {
        let ctl = controller(QuadraticEvaluator::default());
        let bad = OptimizationRequest::new(
            Algorithm::Genetic,
            vec![
                Objective::maximize(MetricKey::PowerOutput, 0.0),
                Objective::minimize(MetricKey::MaterialCost, 0.0),
            ],
        );
        let err = ctl
            .run(&bad, &base_config(), &mut NullSink)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BesError::Request(RequestError::ZeroWeightSum { .. })
        ));
    }

    #[tokio::test]
    async fn second_concurrent_run_is_rejected() {
        let ctl = Arc::new(controller(YieldingEvaluator));
        let slow = request(Algorithm::Genetic).with_max_iterations(200);
        let base = base_config();

        let background = {
            let ctl = Arc::clone(&ctl);
            let base = base.clone();
            tokio::spawn(async move { ctl.run(&slow, &base, &mut NullSink).await })
        };

        // Wait until the background run holds the slot, then collide with it.
        while !ctl.is_running() {
            tokio::task::yield_now().await;
        }
        let err = ctl
            .run(&request(Algorithm::Genetic), &base, &mut NullSink)
            .await
            .unwrap_err();
        assert!(matches!(err, BesError::RunInProgress));

        ctl.cancel();
        let result = background.await.unwrap().unwrap();
        assert!(!result.completed());
    }

    #[tokio::test]
    async fn cancellation_mid_run_yields_partial_trace() {
        let ctl = controller(QuadraticEvaluator::default());
        let token = CancelToken::new();
        let cancel = token.clone();
        // Flip the flag while the second step is being reported; the run
        // honors it at the next iteration boundary.
        let mut sink =
            crate::progress::FnSink::new(move |step: &bes_types::OptimizationStep| {
                if step.iteration == 2 {
                    cancel.cancel();
                }
            });
        let result = ctl
            .run_with_token(
                &request(Algorithm::Genetic).with_max_iterations(50),
                &base_config(),
                token,
                &mut sink,
            )
            .await
            .unwrap();

        assert_eq!(result.termination, Termination::Cancelled);
        assert!(!result.completed());
        assert!(result.iterations >= 2 && result.iterations <= 3);
        assert_eq!(result.convergence_data.len(), result.iterations);
    }

    #[tokio::test]
    async fn dropped_run_future_releases_the_active_slot() {
        let ctl = Arc::new(controller(YieldingEvaluator));
        let slow = request(Algorithm::Genetic).with_max_iterations(200);
        let base = base_config();

        let background = {
            let ctl = Arc::clone(&ctl);
            let base = base.clone();
            tokio::spawn(async move { ctl.run(&slow, &base, &mut NullSink).await })
        };
        while !ctl.is_running() {
            tokio::task::yield_now().await;
        }

        // Abort the in-flight run; the abandoned future must release the
        // slot on drop rather than wedging the controller.
        background.abort();
        let _ = background.await;
        assert!(!ctl.is_running());

        let result = ctl
            .run(
                &request(Algorithm::Genetic).with_max_iterations(2),
                &base,
                &mut NullSink,
            )
            .await
            .unwrap();
        assert_eq!(result.iterations, 2);
    }

    #[tokio::test]
    async fn submit_streams_steps_and_resolves_to_the_result() {
        let ctl = Arc::new(controller(QuadraticEvaluator::default()));
        let (mut rx, handle) = Arc::clone(&ctl).submit(
            request(Algorithm::Genetic).with_max_iterations(4),
            base_config(),
        );
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.iterations, 4);

        let mut streamed = Vec::new();
        while let Some(step) = rx.recv().await {
            streamed.push(step.iteration);
        }
        assert_eq!(streamed, vec![1, 2, 3, 4]);
        assert!(!ctl.is_running());
    }

    #[tokio::test]
    async fn result_reports_improvement_and_sensitivities() {
        let mut base = base_config();
        base.parameters.temperature = 20.0;
        let ctl = controller(QuadraticEvaluator::default());
        let result = ctl
            .run(
                &request(Algorithm::GradientDescent)
                    .with_learning_rate(0.1)
                    .with_max_iterations(10),
                &base,
                &mut NullSink,
            )
            .await
            .unwrap();

        assert!(result.best_fitness > result.baseline_fitness);
        assert!(result.improvement > 0.0);
        assert_eq!(result.sensitivities.len(), 5);
        for entry in &result.sensitivities {
            assert!((0.0..=1.0).contains(&entry.importance));
        }
    }

    #[tokio::test]
    async fn hybrid_trace_length_matches_phase_sum() {
        let ctl = controller(NoisyQuadraticEvaluator::new(0.15, 31));
        let result = ctl
            .run(
                &request(Algorithm::Hybrid)
                    .with_max_iterations(10)
                    .with_convergence_threshold(0.0),
                &base_config(),
                &mut NullSink,
            )
            .await
            .unwrap();
        // ⌊0.7·10⌋ + ⌊0.3·10⌋ genetic + gradient steps, concatenated.
        assert_eq!(result.convergence_data.len(), 10);
        assert_eq!(result.iterations, 10);
    }
}
