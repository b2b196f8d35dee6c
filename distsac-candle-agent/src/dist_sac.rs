//! Goal-conditioned SAC whose critic is a learned distance.
//!
//! The reward is `-1` per step until the goal is reached, so `-min(q1, q2)`
//! at the deterministic action estimates the number of steps from a state to
//! a goal. [`DistSac`] trains the networks on relabeled goals and exposes this
//! estimate through [`DistanceEstimator`].
mod base;
mod config;
mod distance;
pub mod relabel;
pub use base::DistSac;
pub use config::DistSacConfig;
pub use distance::{k_smallest_mean, l2_position_distance, Distance, DistanceEstimator};
