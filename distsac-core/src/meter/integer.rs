use super::Meter;
use std::fmt;

/// Integer counter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegerMeter {
    n: i64,
}

impl IntegerMeter {
    /// Constructs a counter starting from zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` to the counter.
    pub fn increment(&mut self, n: i64) {
        self.n += n;
    }

    /// Returns the counter.
    pub fn count(&self) -> i64 {
        self.n
    }
}

impl Meter for IntegerMeter {
    fn reset(&mut self) {
        self.n = 0;
    }

    /// Counts `n` more events. `value` is ignored.
    fn update(&mut self, _value: f64, n: usize) {
        self.increment(n as i64);
    }

    fn compute(&self) -> f64 {
        self.n as f64
    }
}

impl fmt::Display for IntegerMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_counts_n() {
        let mut m = IntegerMeter::new();
        m.update(0.0, 1);
        m.update(2.7, 4);
        assert_eq!(m.count(), 5);
        assert_eq!(m.to_string(), "5");

        m.reset();
        assert_eq!(m.compute(), 0.0);
    }
}
