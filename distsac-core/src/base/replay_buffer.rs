//! Replay buffer interface.
//!
//! Storage is left to implementors; trainers only sample batches.
use super::TransitionBatch;
use anyhow::{bail, Result};

/// Interface of replay buffers that generate batches for training.
pub trait ReplayBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// The type of batch generated for training.
    type Batch: TransitionBatch;

    /// Builds a new replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Self;

    /// Samples `size` transitions.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;

    /// Samples `size` transitions together with a goal for each of them.
    ///
    /// The goal of a transition is a state later reached in its trajectory.
    /// Buffers that do not store trajectories fail with an error.
    fn goal_batch(&mut self, size: usize) -> Result<Self::Batch> {
        let _ = size;
        bail!("This replay buffer does not sample goals")
    }
}
