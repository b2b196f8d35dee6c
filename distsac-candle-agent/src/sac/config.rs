//! Configuration of SAC agent.
use super::{ActorConfig, CriticConfig, GoalContext};
use crate::{error::AgentError, mlp::MlpConfig, opt::OptimizerConfig, Device};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Width of the hidden layers of the actor and the critic.
const HIDDEN_UNITS: usize = 256;

/// Configuration of the networks and the update rule shared by
/// [`Sac`](super::Sac) and [`DistSac`](crate::dist_sac::DistSac).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ActorCriticConfig {
    pub actor_config: ActorConfig<MlpConfig>,
    pub critic_config: CriticConfig<MlpConfig>,
    pub alpha_opt_config: OptimizerConfig,
    pub goal_context: GoalContext,
    pub gamma: f64,
    pub tau: f64,
    pub policy_freq: usize,
    pub batch_size: usize,
    pub initial_temperature: f64,
    pub target_entropy: Option<f64>,
    pub check_finite: bool,
    pub seed: u64,
    pub device: Device,
}

impl Default for ActorCriticConfig {
    fn default() -> Self {
        Self {
            actor_config: Default::default(),
            critic_config: Default::default(),
            alpha_opt_config: Default::default(),
            goal_context: GoalContext::None,
            gamma: 0.99,
            tau: 0.005,
            policy_freq: 2,
            batch_size: 100,
            initial_temperature: 0.1,
            target_entropy: None,
            check_finite: false,
            seed: 42,
            device: Device::Cpu,
        }
    }
}

impl ActorCriticConfig {
    /// Networks with two hidden layers of 256 units.
    ///
    /// The input dimensions follow `goal_context`.
    pub fn mlp(state_dim: usize, action_dim: usize, goal_context: GoalContext) -> Self {
        let in_dim = goal_context.input_dim(state_dim);
        let units = vec![HIDDEN_UNITS, HIDDEN_UNITS];
        let actor_config = ActorConfig::default()
            .pi_config(MlpConfig::new(in_dim, units.clone(), 0))
            .action_dim(action_dim);
        let critic_config =
            CriticConfig::default().q_config(MlpConfig::new(in_dim + action_dim, units, 1));

        Self {
            actor_config,
            critic_config,
            goal_context,
            ..Default::default()
        }
    }

    /// Sets the learning rate of the actor, the critic and the entropy coefficient.
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.actor_config = self
            .actor_config
            .clone()
            .opt_config(OptimizerConfig::default().learning_rate(lr));
        self.critic_config = self
            .critic_config
            .clone()
            .opt_config(OptimizerConfig::default().learning_rate(lr));
        self.alpha_opt_config = OptimizerConfig::default().learning_rate(lr);
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// The actor, the entropy coefficient and the target critic are updated
    /// when the step is a multiple of `v`.
    pub fn policy_freq(mut self, v: usize) -> Self {
        self.policy_freq = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Initial value of the entropy coefficient.
    pub fn initial_temperature(mut self, v: f64) -> Self {
        self.initial_temperature = v;
        self
    }

    /// Target entropy. If set, the entropy coefficient is tuned automatically.
    pub fn target_entropy(mut self, v: f64) -> Self {
        self.target_entropy = Some(v);
        self
    }

    /// If `true`, training fails on a NaN or infinite loss.
    pub fn check_finite(mut self, v: bool) -> Self {
        self.check_finite = v;
        self
    }

    /// Random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Checks the ranges of the values.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.policy_freq > 0,
            AgentError::InvalidConfig("policy_freq must be positive".to_string())
        );
        ensure!(
            self.batch_size > 0,
            AgentError::InvalidConfig("batch_size must be positive".to_string())
        );
        ensure!(
            (0.0..=1.0).contains(&self.tau),
            AgentError::InvalidConfig(format!("tau must be in [0, 1], got {}", self.tau))
        );
        ensure!(
            self.initial_temperature > 0.0,
            AgentError::InvalidConfig(format!(
                "initial_temperature must be positive, got {}",
                self.initial_temperature
            ))
        );
        Ok(())
    }
}

/// Configuration of [`Sac`](super::Sac).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SacConfig {
    pub actor_critic: ActorCriticConfig,

    /// Scale of the exploration bonus added to rewards.
    pub expl_coef: f64,

    /// Accepted for compatibility with existing configurations; not used by
    /// the update.
    pub dist_threshold: f64,
}

impl Default for SacConfig {
    fn default() -> Self {
        Self {
            actor_critic: Default::default(),
            expl_coef: 0.0,
            dist_threshold: 10.0,
        }
    }
}

impl SacConfig {
    /// Networks with two hidden layers of 256 units taking the state only.
    pub fn mlp(state_dim: usize, action_dim: usize) -> Self {
        Self {
            actor_critic: ActorCriticConfig::mlp(state_dim, action_dim, GoalContext::None),
            ..Default::default()
        }
    }

    /// Sets the configuration of the networks and the update rule.
    pub fn actor_critic(mut self, v: ActorCriticConfig) -> Self {
        self.actor_critic = v;
        self
    }

    /// Scale of the exploration bonus.
    pub fn expl_coef(mut self, v: f64) -> Self {
        self.expl_coef = v;
        self
    }

    /// Distance threshold.
    pub fn dist_threshold(mut self, v: f64) -> Self {
        self.dist_threshold = v;
        self
    }

    /// Constructs [`SacConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`SacConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
