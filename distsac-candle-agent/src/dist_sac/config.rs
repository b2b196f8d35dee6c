//! Configuration of DistSAC agent.
use crate::{
    error::AgentError,
    sac::{ActorCriticConfig, GoalContext},
};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`DistSac`](super::DistSac).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DistSacConfig {
    /// Networks and update rule. `goal_context` must not be [`GoalContext::None`].
    pub actor_critic: ActorCriticConfig,

    /// Number of nearest candidate goals averaged by `get_distance`.
    pub num_candidates: usize,

    /// If `true`, `get_distance` returns the Euclidean distance over the first
    /// two coordinates instead of the learned one.
    pub use_l2: bool,
}

impl Default for DistSacConfig {
    fn default() -> Self {
        Self {
            actor_critic: ActorCriticConfig {
                goal_context: GoalContext::Full,
                ..Default::default()
            },
            num_candidates: 1,
            use_l2: false,
        }
    }
}

impl DistSacConfig {
    /// Networks with two hidden layers of 256 units taking the state and the goal.
    ///
    /// If `only_pos` is `true`, only the first two coordinates of the goal are
    /// fed to the networks.
    pub fn mlp(state_dim: usize, action_dim: usize, only_pos: bool) -> Self {
        let goal_context = match only_pos {
            true => GoalContext::PositionOnly,
            false => GoalContext::Full,
        };
        Self {
            actor_critic: ActorCriticConfig::mlp(state_dim, action_dim, goal_context),
            ..Default::default()
        }
    }

    /// Sets the configuration of the networks and the update rule.
    pub fn actor_critic(mut self, v: ActorCriticConfig) -> Self {
        self.actor_critic = v;
        self
    }

    /// Number of candidate goals averaged by `get_distance`.
    pub fn num_candidates(mut self, v: usize) -> Self {
        self.num_candidates = v;
        self
    }

    /// Euclidean distance instead of the learned one.
    pub fn use_l2(mut self, v: bool) -> Self {
        self.use_l2 = v;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.actor_critic.goal_context.has_goal(),
            AgentError::InvalidConfig("DistSAC networks must take goals".to_string())
        );
        ensure!(
            self.num_candidates > 0,
            AgentError::InvalidConfig("num_candidates must be positive".to_string())
        );
        self.actor_critic.validate()
    }

    /// Constructs [`DistSacConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DistSacConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
