//! Soft actor-critic (SAC) agent.
mod actor;
mod actor_critic;
mod base;
mod config;
mod context;
mod critic;
mod ent_coef;
pub mod squash;
pub use actor::{Actor, ActorConfig, SampledAction};
pub(crate) use actor_critic::{ActorCritic, MetricKeys, TensorBatch};
pub use base::Sac;
pub use config::{ActorCriticConfig, SacConfig};
pub use context::GoalContext;
pub use critic::{Critic, CriticConfig};
pub use ent_coef::EntCoef;
