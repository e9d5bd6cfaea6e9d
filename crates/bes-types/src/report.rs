//! Progress and terminal artifacts of an optimization run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::configuration::{Configuration, OperatingParameters, TunableParam};
use crate::request::Algorithm;

/// One append-only entry in the convergence trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationStep {
    /// 1-based iteration number.
    pub iteration: usize,
    /// Running-best fitness so far. Non-decreasing across the trace for the
    /// population strategies even when the evaluator is noisy.
    pub best_score: f64,
    /// Mean fitness of this iteration's candidates (current fitness for the
    /// single-point gradient strategy).
    pub average_score: f64,
    /// Population spread; `None` for strategies without a population.
    pub diversity: Option<f64>,
    /// Snapshot of the best-known tunables at this iteration.
    pub parameter_snapshot: OperatingParameters,
    pub timestamp: DateTime<Utc>,
}

/// Why the run's main loop exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Running-best fitness plateaued within the convergence window.
    Converged,
    /// The iteration budget was exhausted.
    MaxIterations,
    /// The cancellation flag was honored at an iteration boundary.
    Cancelled,
}

/// Local sensitivity of fitness to one tunable parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSensitivity {
    pub parameter: TunableParam,
    /// Signed finite-difference estimate d(fitness)/d(parameter).
    pub sensitivity: f64,
    /// Heuristic band `sensitivity × [0.8, 1.2]`; not an empirical interval.
    pub confidence_interval: (f64, f64),
    /// `|sensitivity|` normalized so the most sensitive parameter reads 1.0.
    pub importance: f64,
}

/// Terminal artifact of a run, produced exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// Strategy tag as requested (the bayesian alias keeps its own tag).
    pub algorithm: Algorithm,
    pub optimal_configuration: Configuration,
    /// Fitness of the submitted base configuration, measured once at start.
    pub baseline_fitness: f64,
    pub best_fitness: f64,
    /// Estimated improvement over the baseline, percent.
    pub improvement: f64,
    /// Full convergence trace, in iteration order.
    pub convergence_data: Vec<OptimizationStep>,
    pub iterations: usize,
    pub elapsed_ms: u64,
    pub sensitivities: Vec<ParameterSensitivity>,
    pub termination: Termination,
}

impl OptimizationResult {
    /// True unless the run was cancelled before its natural end.
    pub fn completed(&self) -> bool {
        self.termination != Termination::Cancelled
    }
}
