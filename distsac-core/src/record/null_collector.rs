use super::MetricsCollector;
use anyhow::Result;

/// A collector that ignores any value.
#[derive(Debug, Default)]
pub struct NullCollector {}

impl MetricsCollector for NullCollector {
    fn log(&mut self, _key: &str, _value: f32, _step: usize, _n: usize) -> Result<()> {
        Ok(())
    }
}
