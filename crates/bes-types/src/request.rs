//! Optimization run requests.

use serde::{Deserialize, Serialize};

use crate::configuration::TunableParam;
use crate::errors::RequestError;
use crate::objective::Objective;

/// Which search strategy drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Genetic,
    ParticleSwarm,
    GradientDescent,
    /// Placeholder mode: runs the genetic strategy under this tag.
    Bayesian,
    /// Genetic exploration followed by gradient-descent refinement.
    Hybrid,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Genetic => "genetic",
            Self::ParticleSwarm => "particle_swarm",
            Self::GradientDescent => "gradient_descent",
            Self::Bayesian => "bayesian",
            Self::Hybrid => "hybrid",
        };
        write!(f, "{name}")
    }
}

/// A declared constraint on a tunable parameter.
///
/// Accepted on the wire for compatibility, but no strategy enforces these;
/// bounds come from the [`ParameterSpace`](crate::ParameterSpace) instead.
/// The controller logs a warning when a request carries any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Constraint {
    Bounds {
        parameter: TunableParam,
        min: f64,
        max: f64,
    },
    Discrete {
        parameter: TunableParam,
        values: Vec<f64>,
    },
}

fn default_max_iterations() -> usize {
    50
}

fn default_convergence_threshold() -> f64 {
    0.001
}

/// Top-level request for one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRequest {
    pub algorithm: Algorithm,

    pub objectives: Vec<Objective>,

    /// Accepted but behaviorally inert (see [`Constraint`]).
    #[serde(default)]
    pub constraints: Vec<Constraint>,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Population/swarm size for the genetic and particle-swarm strategies.
    #[serde(default)]
    pub population_size: Option<usize>,

    /// Initial learning rate for the gradient-descent strategy.
    #[serde(default)]
    pub learning_rate: Option<f64>,

    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,

    /// RNG seed for reproducible runs; `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl OptimizationRequest {
    pub const DEFAULT_POPULATION_SIZE: usize = 20;
    pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

    pub fn new(algorithm: Algorithm, objectives: Vec<Objective>) -> Self {
        Self {
            algorithm,
            objectives,
            constraints: Vec::new(),
            max_iterations: default_max_iterations(),
            population_size: None,
            learning_rate: None,
            convergence_threshold: default_convergence_threshold(),
            seed: None,
        }
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = Some(n);
        self
    }

    pub fn with_learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = Some(rate);
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Effective population size, defaulted when the request omits it.
    pub fn population_size(&self) -> usize {
        self.population_size.unwrap_or(Self::DEFAULT_POPULATION_SIZE)
    }

    /// Effective initial learning rate, defaulted when the request omits it.
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate.unwrap_or(Self::DEFAULT_LEARNING_RATE)
    }

    /// Validate scalar fields. Objective weights are checked separately by
    /// [`Objective::normalize_weights`].
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.objectives.is_empty() {
            return Err(RequestError::EmptyObjectives);
        }
        if self.max_iterations == 0 {
            return Err(RequestError::ZeroIterations);
        }
        let population = self.population_size();
        if population < 2 {
            return Err(RequestError::PopulationTooSmall(population));
        }
        let rate = self.learning_rate();
        if !(rate > 0.0) {
            return Err(RequestError::NonPositiveLearningRate(rate));
        }
        if self.convergence_threshold < 0.0 {
            return Err(RequestError::NegativeConvergenceThreshold(
                self.convergence_threshold,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::MetricKey;

    fn sample_request() -> OptimizationRequest {
        OptimizationRequest::new(
            Algorithm::Genetic,
            vec![Objective::maximize(MetricKey::PowerOutput, 1.0)],
        )
    }

    #[test]
    fn defaults_applied() {
        let request = sample_request();
        assert_eq!(request.max_iterations, 50);
        assert_eq!(request.population_size(), 20);
        assert_eq!(request.learning_rate(), 0.1);
        assert_eq!(request.convergence_threshold, 0.001);
        request.validate().unwrap();
    }

    #[test]
    fn zero_iterations_rejected() {
        let request = sample_request().with_max_iterations(0);
        assert!(matches!(
            request.validate(),
            Err(RequestError::ZeroIterations)
        ));
    }

    #[test]
    fn tiny_population_rejected() {
        let request = sample_request().with_population_size(1);
        assert!(matches!(
            request.validate(),
            Err(RequestError::PopulationTooSmall(1))
        ));
    }

    #[test]
    fn non_positive_learning_rate_rejected() {
        let request = sample_request().with_learning_rate(0.0);
        assert!(matches!(
            request.validate(),
            Err(RequestError::NonPositiveLearningRate(_))
        ));
    }

    #[test]
    fn request_deserializes_from_wire_json() {
        let json = r#"{
            "algorithm": "particle_swarm",
            "objectives": [
                {"metric": "powerOutput", "weight": 0.7, "direction": "maximize"},
                {"metric": "materialCost", "weight": 0.3, "direction": "minimize"}
            ],
            "maxIterations": 25,
            "populationSize": 12,
            "convergenceThreshold": 0.01
        }"#;
        let request: OptimizationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.algorithm, Algorithm::ParticleSwarm);
        assert_eq!(request.objectives.len(), 2);
        assert_eq!(request.max_iterations, 25);
        assert_eq!(request.population_size(), 12);
        assert!(request.constraints.is_empty());
        assert_eq!(request.seed, None);
    }

    #[test]
    fn constraints_accepted_on_the_wire() {
        let json = r#"{
            "algorithm": "genetic",
            "objectives": [{"metric": "powerOutput", "weight": 1.0}],
            "constraints": [
                {"kind": "bounds", "parameter": "temperature", "min": 20.0, "max": 40.0}
            ]
        }"#;
        let request: OptimizationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.constraints.len(), 1);
    }
}
