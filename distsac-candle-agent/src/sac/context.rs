//! Goal inputs of the networks.
use crate::error::AgentError;
use anyhow::Result;
use candle_core::Tensor;
use serde::{Deserialize, Serialize};

/// Number of leading state coordinates forming a position.
const POSITION_DIM: usize = 2;

/// How a goal enters the actor and the critic.
///
/// The mode is fixed when the networks are built, since it determines their
/// input dimensions.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum GoalContext {
    /// The networks see the state only.
    None,

    /// The full goal state is appended to the state.
    Full,

    /// The first two coordinates of the goal are appended to the state.
    PositionOnly,
}

impl Default for GoalContext {
    fn default() -> Self {
        Self::None
    }
}

impl GoalContext {
    /// Returns the width of the state and goal part of the network input.
    pub fn input_dim(&self, state_dim: usize) -> usize {
        match self {
            Self::None => state_dim,
            Self::Full => 2 * state_dim,
            Self::PositionOnly => state_dim + POSITION_DIM,
        }
    }

    /// Returns `true` if the networks take a goal.
    pub fn has_goal(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Concatenates the state and the goal features along the last dimension.
    ///
    /// `goal` is ignored in [`GoalContext::None`] and required otherwise.
    pub fn input(&self, state: &Tensor, goal: Option<&Tensor>) -> Result<Tensor> {
        let goal = match (self, goal) {
            (Self::None, _) => return Ok(state.clone()),
            (_, None) => return Err(AgentError::MissingGoal.into()),
            (Self::Full, Some(goal)) => goal.clone(),
            (Self::PositionOnly, Some(goal)) => goal.narrow(1, 0, POSITION_DIM)?,
        };
        Ok(Tensor::cat(&[state, &goal], 1)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_position_only_truncates_goal() -> Result<()> {
        let state = Tensor::new(&[[1f32, 2., 3.]], &Device::Cpu)?;
        let goal = Tensor::new(&[[4f32, 5., 6.]], &Device::Cpu)?;

        let x = GoalContext::PositionOnly.input(&state, Some(&goal))?;
        assert_eq!(x.to_vec2::<f32>()?, vec![vec![1., 2., 3., 4., 5.]]);
        assert_eq!(GoalContext::PositionOnly.input_dim(3), 5);

        let x = GoalContext::Full.input(&state, Some(&goal))?;
        assert_eq!(x.dims(), &[1, 6]);

        let x = GoalContext::None.input(&state, Some(&goal))?;
        assert_eq!(x.dims(), &[1, 3]);

        assert!(GoalContext::Full.input(&state, None).is_err());
        Ok(())
    }
}
