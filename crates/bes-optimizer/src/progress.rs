//! Progress sinks: where per-iteration steps are forwarded.

use bes_types::OptimizationStep;
use tokio::sync::mpsc;

/// Receives one [`OptimizationStep`] per iteration, synchronously.
///
/// The callback gates forward progress: the optimizer does not start the
/// next iteration until `on_step` returns, so implementations must not
/// block for long.
pub trait ProgressSink: Send {
    fn on_step(&mut self, step: &OptimizationStep);
}

/// Discards all progress.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_step(&mut self, _step: &OptimizationStep) {}
}

/// Forwards steps over an unbounded tokio channel.
///
/// Sends never block; a closed receiver is ignored so a departed consumer
/// cannot abort the run.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OptimizationStep>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<OptimizationStep>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn on_step(&mut self, step: &OptimizationStep) {
        let _ = self.tx.send(step.clone());
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(F);

impl<F> FnSink<F>
where
    F: FnMut(&OptimizationStep) + Send,
{
    pub fn new(callback: F) -> Self {
        Self(callback)
    }
}

impl<F> ProgressSink for FnSink<F>
where
    F: FnMut(&OptimizationStep) + Send,
{
    fn on_step(&mut self, step: &OptimizationStep) {
        (self.0)(step)
    }
}
