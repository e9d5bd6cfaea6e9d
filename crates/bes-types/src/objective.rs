//! Optimization objectives: weighted, directional targets over evaluator
//! readings.

use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

/// Whether we are maximizing or minimizing an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Default for Direction {
    fn default() -> Self {
        Self::Maximize
    }
}

/// A raw performance reading the evaluator reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    PowerOutput,
    CoulombicEfficiency,
    StabilityIndex,
    LifespanEstimate,
    MaterialCost,
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PowerOutput => "powerOutput",
            Self::CoulombicEfficiency => "coulombicEfficiency",
            Self::StabilityIndex => "stabilityIndex",
            Self::LifespanEstimate => "lifespanEstimate",
            Self::MaterialCost => "materialCost",
        };
        write!(f, "{name}")
    }
}

/// One weighted, directional optimization target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    /// Which evaluator reading this objective scores.
    pub metric: MetricKey,
    /// Relative weight in `[0, 1]`; the set is renormalized to sum to 1.
    pub weight: f64,
    #[serde(default)]
    pub direction: Direction,
}

impl Objective {
    pub fn maximize(metric: MetricKey, weight: f64) -> Self {
        Self {
            metric,
            weight,
            direction: Direction::Maximize,
        }
    }

    pub fn minimize(metric: MetricKey, weight: f64) -> Self {
        Self {
            metric,
            weight,
            direction: Direction::Minimize,
        }
    }

    /// Renormalize `objectives` in place so the weights sum to 1.
    ///
    /// Rejects empty sets, weights outside `[0, 1]`, and non-positive weight
    /// sums. The reference system silently skipped normalization when the sum
    /// was not positive; that defect class is rejected here instead.
    pub fn normalize_weights(objectives: &mut [Objective]) -> Result<(), RequestError> {
        if objectives.is_empty() {
            return Err(RequestError::EmptyObjectives);
        }
        for obj in objectives.iter() {
            if !(0.0..=1.0).contains(&obj.weight) || !obj.weight.is_finite() {
                return Err(RequestError::WeightOutOfRange {
                    metric: obj.metric.to_string(),
                    weight: obj.weight,
                });
            }
        }
        let total: f64 = objectives.iter().map(|o| o.weight).sum();
        if total <= 0.0 {
            return Err(RequestError::ZeroWeightSum { total });
        }
        for obj in objectives.iter_mut() {
            obj.weight /= total;
        }
        Ok(())
    }
}
