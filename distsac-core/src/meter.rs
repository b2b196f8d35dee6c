//! Meters accumulating named training statistics.
//!
//! Three kinds of meters are provided:
//!
//! * [`IntegerMeter`] - an integer counter,
//! * [`AverageMeter`] - a cumulative average `sum(values) / sum(counts)`,
//! * [`MovingAverageMeter`] - the same average over a fixed window of the
//!   most recent updates.
//!
//! All of them implement [`Meter`] so that a [`StatsTracker`](crate::StatsTracker)
//! can hold them by name.
use std::fmt::{Debug, Display};
mod average;
mod integer;
mod moving_average;
pub use average::AverageMeter;
pub use integer::IntegerMeter;
pub use moving_average::MovingAverageMeter;

/// Interface of meters.
///
/// The [`Display`] implementation renders the value printed by
/// [`Logger::dump`](crate::Logger::dump).
pub trait Meter: Display + Debug + Send {
    /// Clears the accumulated state.
    fn reset(&mut self);

    /// Accumulates `value` weighted by `n`.
    fn update(&mut self, value: f64, n: usize);

    /// Returns the current value of the meter.
    fn compute(&self) -> f64;
}
