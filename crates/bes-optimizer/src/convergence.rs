//! Plateau detection over the running-best fitness series.

/// Detects a fitness plateau over a trailing window of iterations.
///
/// Fed one running-best value per iteration. Reports convergence once at
/// least `warmup` values have been recorded and the spread (`max − min`) of
/// the last `window` values falls below the threshold. Because the
/// population strategies feed a non-decreasing series, the spread is simply
/// how much the best improved across the window.
#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    warmup: usize,
    window: usize,
    threshold: f64,
    history: Vec<f64>,
}

impl ConvergenceMonitor {
    pub fn new(warmup: usize, window: usize, threshold: f64) -> Self {
        Self {
            warmup,
            window,
            threshold,
            history: Vec::new(),
        }
    }

    /// Record this iteration's running-best fitness; returns true when the
    /// plateau criterion is met.
    pub fn record(&mut self, running_best: f64) -> bool {
        self.history.push(running_best);
        if self.history.len() < self.warmup || self.history.len() < self.window {
            return false;
        }
        let tail = &self.history[self.history.len() - self.window..];
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &value in tail {
            min = min.min(value);
            max = max.max(value);
        }
        max - min < self.threshold
    }

    pub fn iterations(&self) -> usize {
        self.history.len()
    }
}
