//! Post-run finite-difference sensitivity ranking.

use bes_types::{
    BesResult, Configuration, Evaluator, ParameterSensitivity, ParameterSpace, TunableParam,
};
use tracing::debug;

use crate::fitness::FitnessAggregator;

/// Relative perturbation applied to each parameter's current value.
const RELATIVE_STEP: f64 = 0.05;
/// Heuristic band reported around each estimate; not empirically derived.
const BAND_LOW: f64 = 0.8;
const BAND_HIGH: f64 = 1.2;

/// Ranks the tunable parameters by how strongly fitness responds to each,
/// evaluated locally around a finished run's best configuration.
#[derive(Debug, Clone, Default)]
pub struct SensitivityAnalyzer;

impl SensitivityAnalyzer {
    /// Perturb each parameter by ±5% of its current value (others held
    /// fixed), estimate the signed slope, and normalize importances so the
    /// most sensitive parameter reads 1.0.
    ///
    /// The returned ranking is sorted by importance, descending. The
    /// confidence interval is the fixed `sensitivity × [0.8, 1.2]` band the
    /// reference system reported, kept as documented behavior.
    pub async fn analyze(
        &self,
        aggregator: &FitnessAggregator,
        evaluator: &dyn Evaluator,
        config: &Configuration,
        space: &ParameterSpace,
    ) -> BesResult<Vec<ParameterSensitivity>> {
        let mut probes = Vec::with_capacity(TunableParam::ALL.len() * 2);
        let mut denominators = [0.0; 5];
        for (slot, param) in denominators.iter_mut().zip(TunableParam::ALL) {
            let value = config.parameters.get(param);
            let offset = RELATIVE_STEP * value;
            let plus = space.clip(param, value + offset);
            let minus = space.clip(param, value - offset);
            *slot = plus - minus;

            let mut probe = config.clone();
            probe.parameters.set(param, plus);
            probes.push(probe);
            let mut probe = config.clone();
            probe.parameters.set(param, minus);
            probes.push(probe);
        }

        let scores = aggregator.score_batch(evaluator, &probes).await?;

        let mut sensitivities: Vec<ParameterSensitivity> = TunableParam::ALL
            .into_iter()
            .enumerate()
            .map(|(i, parameter)| {
                let sensitivity = if denominators[i] > 0.0 {
                    (scores[2 * i] - scores[2 * i + 1]) / denominators[i]
                } else {
                    0.0
                };
                ParameterSensitivity {
                    parameter,
                    sensitivity,
                    confidence_interval: (BAND_LOW * sensitivity, BAND_HIGH * sensitivity),
                    importance: 0.0,
                }
            })
            .collect();

        let max_magnitude = sensitivities
            .iter()
            .map(|s| s.sensitivity.abs())
            .fold(0.0_f64, f64::max);
        if max_magnitude > 0.0 {
            for entry in &mut sensitivities {
                entry.importance = entry.sensitivity.abs() / max_magnitude;
            }
        }

        sensitivities.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        debug!(
            leader = %sensitivities[0].parameter,
            "sensitivity ranking computed"
        );
        Ok(sensitivities)
    }
}
