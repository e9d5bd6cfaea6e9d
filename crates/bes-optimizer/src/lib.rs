//! # bes-optimizer
//!
//! Multi-strategy configuration optimizer for bioelectrochemical systems.
//!
//! Provides fitness aggregation over weighted directional objectives,
//! convergence monitoring, five interchangeable search strategies (genetic,
//! particle swarm, gradient descent, a bayesian alias, and a genetic→gradient
//! hybrid), post-run parameter sensitivity analysis, and a controller that
//! orchestrates a run end to end with streamed progress and cooperative
//! cancellation.

mod controller;
mod convergence;
mod fitness;
mod genetic;
mod gradient;
mod hybrid;
mod progress;
mod sensitivity;
mod strategy;
mod swarm;

#[cfg(test)]
pub(crate) mod testutil;

pub use controller::OptimizationController;
pub use convergence::ConvergenceMonitor;
pub use fitness::FitnessAggregator;
pub use genetic::GeneticOptimizer;
pub use gradient::GradientDescentOptimizer;
pub use hybrid::HybridOptimizer;
pub use progress::{ChannelSink, FnSink, NullSink, ProgressSink};
pub use sensitivity::SensitivityAnalyzer;
pub use strategy::{CancelToken, OptimizerStrategy, RunContext, StrategyOutcome};
pub use swarm::ParticleSwarmOptimizer;
