use super::MetricsCollector;
use anyhow::Result;

/// A single call to [`MetricsCollector::log`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedValue {
    /// Key of the metric.
    pub key: String,

    /// Logged value.
    pub value: f32,

    /// Training step.
    pub step: usize,

    /// Number of transitions the value summarizes.
    pub n: usize,
}

/// Buffered collector.
///
/// Keeps every logged value in memory in the order of arrival.
#[derive(Debug, Default)]
pub struct BufferedCollector {
    buf: Vec<LoggedValue>,
}

impl BufferedCollector {
    /// Constructs the collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the logged values.
    pub fn iter(&self) -> std::slice::Iter<LoggedValue> {
        self.buf.iter()
    }

    /// Returns the values logged with the given key.
    pub fn values(&self, key: &str) -> Vec<&LoggedValue> {
        self.buf.iter().filter(|v| v.key == key).collect()
    }

    /// Returns `true` if a value was logged with the given key.
    pub fn contains(&self, key: &str) -> bool {
        self.buf.iter().any(|v| v.key == key)
    }
}

impl MetricsCollector for BufferedCollector {
    fn log(&mut self, key: &str, value: f32, step: usize, n: usize) -> Result<()> {
        self.buf.push(LoggedValue {
            key: key.to_string(),
            value,
            step,
            n,
        });
        Ok(())
    }
}
