use anyhow::Result;

/// Receives scalar metrics from trainers.
///
/// `value` is accumulated into the meter named by `key`, weighted by the
/// number of transitions `n` it summarizes. Trainers pass sums over a batch
/// together with the batch size, so a meter averaging `sum(values) / sum(n)`
/// yields per-transition means.
pub trait MetricsCollector {
    /// Logs a value associated with the training step `step`.
    fn log(&mut self, key: &str, value: f32, step: usize, n: usize) -> Result<()>;
}
