//! Raw performance readings and the external evaluator contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::configuration::Configuration;
use crate::errors::EvaluatorResult;
use crate::objective::MetricKey;

/// One set of raw performance readings for a configuration.
///
/// Field names define the wire contract verbatim (`powerOutput`, …).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Areal power density, mW/m².
    pub power_output: f64,
    /// Coulombic efficiency, %.
    pub coulombic_efficiency: f64,
    /// Long-term operational stability, 0–100.
    pub stability_index: f64,
    /// Projected electrode lifespan, days.
    pub lifespan_estimate: f64,
    /// Material cost, $/m² of electrode area.
    pub material_cost: f64,
}

impl PerformanceMetrics {
    pub fn get(&self, key: MetricKey) -> f64 {
        match key {
            MetricKey::PowerOutput => self.power_output,
            MetricKey::CoulombicEfficiency => self.coulombic_efficiency,
            MetricKey::StabilityIndex => self.stability_index,
            MetricKey::LifespanEstimate => self.lifespan_estimate,
            MetricKey::MaterialCost => self.material_cost,
        }
    }
}

/// External scoring function mapping a [`Configuration`] to raw readings.
///
/// Implementations may be called concurrently for an entire population
/// within one optimizer iteration, and are *not* required to be
/// deterministic: bounded multiplicative noise (roughly ±15–20% per call)
/// is expected and must not be treated as an error. Callers therefore never
/// cache readings across iterations.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, configuration: &Configuration) -> EvaluatorResult<PerformanceMetrics>;
}
