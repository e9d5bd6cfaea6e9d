//! Run an optimization request against the simulated evaluator.
//!
//! Usage: `bes_optimize <request.json> [configuration.json]`
//!
//! Steps stream to the log as the run progresses; the terminal result is
//! printed to stdout as JSON.

use std::sync::Arc;

use anyhow::Context;
use bes_engine::SimulationEvaluator;
use bes_optimizer::{FnSink, OptimizationController};
use bes_types::{Configuration, OptimizationRequest, OptimizationStep};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let request_path = std::env::args()
        .nth(1)
        .context("usage: bes_optimize <request.json> [configuration.json]")?;
    let request: OptimizationRequest = serde_json::from_str(
        &std::fs::read_to_string(&request_path)
            .with_context(|| format!("reading {request_path}"))?,
    )?;

    let base = match std::env::args().nth(2) {
        Some(config_path) => serde_json::from_str(
            &std::fs::read_to_string(&config_path)
                .with_context(|| format!("reading {config_path}"))?,
        )?,
        None => Configuration::new("baseline cell"),
    };

    let controller = OptimizationController::new(Arc::new(SimulationEvaluator::new()));
    let mut sink = FnSink::new(|step: &OptimizationStep| {
        info!(
            iteration = step.iteration,
            best = step.best_score,
            average = step.average_score,
            "optimization step"
        );
    });

    let result = controller.run(&request, &base, &mut sink).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
