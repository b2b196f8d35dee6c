use super::Meter;
use std::fmt;

/// Cumulative average `sum(values) / max(1, sum(counts))`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AverageMeter {
    sum: f64,
    count: usize,
}

impl AverageMeter {
    /// Constructs an empty meter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Meter for AverageMeter {
    fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }

    fn update(&mut self, value: f64, n: usize) {
        self.sum += value;
        self.count += n;
    }

    fn compute(&self) -> f64 {
        self.sum / self.count.max(1) as f64
    }
}

impl fmt::Display for AverageMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.compute())
    }
}
