use super::Meter;
use crate::error::CoreError;
use std::fmt;

/// Average over a window of the most recent updates.
///
/// Each update occupies one slot of a circular buffer of `window_size`
/// `(value, count)` pairs; the oldest slot is overwritten once the buffer is
/// full. The average is `sum(values) / max(1, sum(counts))` over the whole
/// buffer. Slots that were never written hold `(0, 0)`, so they add nothing
/// to either sum.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageMeter {
    window_size: usize,
    vals: Vec<f64>,
    counts: Vec<usize>,
    pointer: usize,
}

impl MovingAverageMeter {
    /// Constructs a meter with the given window size.
    ///
    /// Fails with [`CoreError::InvalidWindowSize`] if `window_size` is zero.
    pub fn new(window_size: usize) -> Result<Self, CoreError> {
        if window_size == 0 {
            return Err(CoreError::InvalidWindowSize(window_size));
        }
        Ok(Self {
            window_size,
            vals: vec![0.0; window_size],
            counts: vec![0; window_size],
            pointer: 0,
        })
    }

    /// Returns the window size.
    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

impl Meter for MovingAverageMeter {
    fn reset(&mut self) {
        self.vals.iter_mut().for_each(|v| *v = 0.0);
        self.counts.iter_mut().for_each(|c| *c = 0);
        self.pointer = 0;
    }

    fn update(&mut self, value: f64, n: usize) {
        self.vals[self.pointer] = value;
        self.counts[self.pointer] = n;
        self.pointer = (self.pointer + 1) % self.window_size;
    }

    fn compute(&self) -> f64 {
        let count = self.counts.iter().sum::<usize>().max(1);
        self.vals.iter().sum::<f64>() / count as f64
    }
}

impl fmt::Display for MovingAverageMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.compute())
    }
}
