//! Goal relabeling of sampled transitions.
//!
//! Each transition keeps the goal sampled from its trajectory, or, with
//! probability 0.1, takes its own state as the goal. A transition is done when
//! its state coincides with its goal, and its reward is `-(1 - done)`.
use crate::error::AgentError;
use anyhow::Result;
use ndarray::{Array1, Array2, Zip};

/// A transition takes its own state as the goal if its mask noise is greater
/// than this value.
pub const SELF_GOAL_THRESHOLD: f32 = 0.9;

/// A state reaches a goal if their Euclidean distance is below this value.
pub const GOAL_TOLERANCE: f32 = 1e-5;

/// Relabeled goals, done flags and rewards.
#[derive(Debug, Clone, PartialEq)]
pub struct Relabeled {
    /// `(batch_size, state_dim)`.
    pub goals: Array2<f32>,

    /// `1.0` if the state reaches the goal, `0.0` otherwise.
    pub done: Array1<f32>,

    /// `-(1 - done)`.
    pub reward: Array1<f32>,
}

/// `1.0` for transitions taking their own state as the goal, `0.0` otherwise.
///
/// The comparison is strict: a mask noise of exactly 0.9 keeps the trajectory goal.
pub fn self_goal_mask(mask_noise: &[f32]) -> Array1<f32> {
    mask_noise
        .iter()
        .map(|&u| if u > SELF_GOAL_THRESHOLD { 1.0 } else { 0.0 })
        .collect()
}

/// Relabels the goals of a batch given one uniform mask noise per transition.
///
/// Fails with [`AgentError::GoalShapeMismatch`] unless `traj_goals` has the
/// shape of `state` and `mask_noise` has one value per row.
pub fn relabel(
    state: &Array2<f32>,
    traj_goals: &Array2<f32>,
    mask_noise: &[f32],
) -> Result<Relabeled> {
    if traj_goals.dim() != state.dim() || mask_noise.len() != state.nrows() {
        return Err(AgentError::GoalShapeMismatch {
            states: state.dim(),
            goals: traj_goals.dim(),
            masks: mask_noise.len(),
        }
        .into());
    }
    let same_goal = self_goal_mask(mask_noise);

    let mut goals = traj_goals.clone();
    Zip::from(goals.rows_mut())
        .and(state.rows())
        .and(&same_goal)
        .for_each(|mut goal, s, &same| {
            if same > 0.0 {
                goal.assign(&s);
            }
        });

    let done: Array1<f32> = state
        .rows()
        .into_iter()
        .zip(goals.rows())
        .map(|(s, g)| {
            let d = (&s - &g).mapv(|x| x * x).sum().sqrt();
            if d < GOAL_TOLERANCE {
                1.0
            } else {
                0.0
            }
        })
        .collect();
    let reward = done.mapv(|d| -(1.0 - d));

    Ok(Relabeled {
        goals,
        done,
        reward,
    })
}
