use thiserror::Error;

/// Main error type for the BES optimizer system
#[derive(Error, Debug)]
pub enum BesError {
    #[error("Evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("An optimization run is already active on this controller")]
    RunInProgress,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors surfaced by an external [`Evaluator`](crate::Evaluator).
///
/// Noise is *not* an error: the evaluator contract allows non-deterministic
/// readings. Any variant here aborts the run immediately — there is no retry
/// policy.
#[derive(Error, Debug)]
pub enum EvaluatorError {
    #[error("Evaluator unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration rejected by evaluator: {0}")]
    InvalidConfiguration(String),

    #[error("Evaluation failed: {0}")]
    Failed(String),
}

/// Validation errors for an [`OptimizationRequest`](crate::OptimizationRequest).
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Request contains no objectives")]
    EmptyObjectives,

    #[error("Objective weights sum to {total}; the sum must be positive")]
    ZeroWeightSum { total: f64 },

    #[error("Objective weight {weight} for {metric} is outside [0, 1]")]
    WeightOutOfRange { metric: String, weight: f64 },

    #[error("maxIterations must be at least 1")]
    ZeroIterations,

    #[error("populationSize must be at least 2, got {0}")]
    PopulationTooSmall(usize),

    #[error("learningRate must be positive, got {0}")]
    NonPositiveLearningRate(f64),

    #[error("convergenceThreshold must be non-negative, got {0}")]
    NegativeConvergenceThreshold(f64),
}

/// Result type alias for BES optimizer operations
pub type BesResult<T> = Result<T, BesError>;

/// Result type alias for evaluator implementations
pub type EvaluatorResult<T> = Result<T, EvaluatorError>;
