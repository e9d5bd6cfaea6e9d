//! Fitness aggregation: weighted, direction-adjusted objective readings
//! collapsed into one scalar where higher is always better.

use bes_types::{
    BesResult, Configuration, Direction, Evaluator, Objective, PerformanceMetrics, RequestError,
};
use futures::future::try_join_all;

/// Combines evaluator readings into a single fitness scalar.
///
/// One evaluator call per scoring, never cached: the evaluator is allowed to
/// be noisy, and every generation re-evaluates fresh so the noise stays part
/// of the landscape instead of getting frozen into stale scores.
#[derive(Debug, Clone)]
pub struct FitnessAggregator {
    objectives: Vec<Objective>,
}

impl FitnessAggregator {
    /// Build an aggregator, renormalizing the objective weights to sum to 1.
    ///
    /// Rejects empty sets and non-positive weight sums.
    pub fn new(mut objectives: Vec<Objective>) -> Result<Self, RequestError> {
        Objective::normalize_weights(&mut objectives)?;
        Ok(Self { objectives })
    }

    /// Collapse one set of readings into a scalar fitness.
    ///
    /// Minimized objectives contribute negated, so higher is always better.
    pub fn combine(&self, metrics: &PerformanceMetrics) -> f64 {
        self.objectives
            .iter()
            .map(|obj| {
                let raw = metrics.get(obj.metric);
                let signed = match obj.direction {
                    Direction::Maximize => raw,
                    Direction::Minimize => -raw,
                };
                obj.weight * signed
            })
            .sum()
    }

    /// Evaluate `config` once and aggregate the readings.
    pub async fn score(
        &self,
        evaluator: &dyn Evaluator,
        config: &Configuration,
    ) -> BesResult<f64> {
        let metrics = evaluator.evaluate(config).await?;
        Ok(self.combine(&metrics))
    }

    /// Score a whole batch concurrently (fan-out/join).
    ///
    /// The returned scores keep the input index order, so strict-improvement
    /// updates resolve ties toward the first index deterministically. Any
    /// evaluator failure aborts the whole batch.
    pub async fn score_batch(
        &self,
        evaluator: &dyn Evaluator,
        configs: &[Configuration],
    ) -> BesResult<Vec<f64>> {
        try_join_all(configs.iter().map(|config| self.score(evaluator, config))).await
    }
}
