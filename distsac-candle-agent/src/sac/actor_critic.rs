//! Networks and update phases shared by the SAC trainers.
use super::{Actor, ActorCriticConfig, Critic, EntCoef};
use crate::{
    error::AgentError,
    mlp::Mlp,
    noise::NoiseSource,
    util::{check_finite, track},
};
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::loss::mse;
use distsac_core::record::{MetricsCollector, Record, RecordValue};
use log::{info, trace};
use std::{
    convert::TryFrom,
    fs,
    path::{Path, PathBuf},
};

/// A batch of transitions on the device of the agent.
pub(crate) struct TensorBatch {
    pub state: Tensor,
    pub action: Tensor,
    /// `(batch_size, 1)`.
    pub reward: Tensor,
    pub next_state: Tensor,
    /// `1 - done`, `(batch_size, 1)`.
    pub not_done: Tensor,
    pub goal: Option<Tensor>,
}

impl TensorBatch {
    pub fn len(&self) -> usize {
        self.reward.dims()[0]
    }
}

/// Keys under which an update step reports to a [`MetricsCollector`].
pub(crate) struct MetricKeys {
    pub batch_reward: &'static str,
    pub critic_loss: &'static str,
    pub actor_loss: &'static str,
}

/// Result of [`ActorCritic::fit_actor`].
pub(crate) struct ActorFit {
    pub loss_actor: f32,
    pub loss_alpha: Option<f32>,
}

/// Returns `<directory>/model/<name>_<timestep>.safetensors`.
fn checkpoint_path(directory: &Path, name: &str, timestep: usize) -> PathBuf {
    directory
        .join("model")
        .join(format!("{}_{}.safetensors", name, timestep))
}

/// Actor, twin critic, target critic and entropy coefficient.
pub(crate) struct ActorCritic {
    pub actor: Actor<Mlp>,
    pub critic: Critic<Mlp>,
    pub critic_tgt: Critic<Mlp>,
    pub ent_coef: EntCoef,
    pub noise: NoiseSource,
    pub device: Device,
    gamma: f64,
    tau: f64,
    policy_freq: usize,
    batch_size: usize,
    check_finite: bool,
}

impl ActorCritic {
    pub fn build(config: &ActorCriticConfig) -> Result<Self> {
        config.validate()?;
        let device = Device::try_from(config.device)?;
        let mut noise = NoiseSource::seed_from_u64(config.seed);
        let context = config.goal_context;

        let actor = Actor::build(
            config.actor_config.clone(),
            context,
            device.clone(),
            &mut noise,
        )?;
        let critic = Critic::build(
            config.critic_config.clone(),
            context,
            device.clone(),
            &mut noise,
        )?;
        let critic_tgt = critic.try_clone()?;
        let ent_coef = EntCoef::new(
            config.initial_temperature,
            config.target_entropy,
            config.alpha_opt_config.clone(),
            &device,
        )?;
        info!("Build actor-critic with {:?}", context);

        Ok(Self {
            actor,
            critic,
            critic_tgt,
            ent_coef,
            noise,
            device,
            gamma: config.gamma,
            tau: config.tau,
            policy_freq: config.policy_freq,
            batch_size: config.batch_size,
            check_finite: config.check_finite,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Regression target of the critic, detached from the graph.
    ///
    /// `reward + not_done * gamma * (min(q1', q2')(s', a') - alpha * log_pi(a'|s'))`
    /// where `a'` is sampled from the current actor and `q'` is the target critic.
    pub fn critic_target(
        &mut self,
        next_state: &Tensor,
        goal: Option<&Tensor>,
        reward: &Tensor,
        not_done: &Tensor,
    ) -> Result<Tensor> {
        let alpha = self.ent_coef.alpha()?;
        let next = self
            .actor
            .sample(next_state, goal, &mut self.noise, true)?;
        let log_pi = next.log_prob.ok_or(AgentError::LogProbWithoutSample)?;
        let next_q = self.critic_tgt.min_q(next_state, goal, &next.action)?;
        let next_v = (next_q - log_pi.affine(alpha, 0.0)?)?;
        let tgt = (reward + (not_done * next_v)?.affine(self.gamma, 0.0)?)?;
        Ok(tgt.detach())
    }

    /// One optimization step of the critic on the sum of the squared errors of
    /// both heads. Returns the loss.
    pub fn fit_critic(
        &mut self,
        state: &Tensor,
        goal: Option<&Tensor>,
        action: &Tensor,
        target: &Tensor,
    ) -> Result<f32> {
        let (q1, q2) = self.critic.forward(state, goal, action)?;
        let loss = (mse(&q1, target)? + mse(&q2, target)?)?;
        let value = loss.to_scalar::<f32>()?;
        check_finite("critic", value, self.check_finite)?;
        self.critic.backward_step(&loss)?;
        Ok(value)
    }

    /// One optimization step of the actor, then of the entropy coefficient.
    ///
    /// The actor loss is `mean(alpha * log_pi - min(q1, q2))` with `alpha`
    /// taken as a constant; only the actor is updated by it.
    pub fn fit_actor(&mut self, state: &Tensor, goal: Option<&Tensor>) -> Result<ActorFit> {
        let alpha = self.ent_coef.alpha()?;
        let sample = self.actor.sample(state, goal, &mut self.noise, true)?;
        let log_pi = sample.log_prob.ok_or(AgentError::LogProbWithoutSample)?;
        let q = self.critic.min_q(state, goal, &sample.action)?;
        let loss = (log_pi.affine(alpha, 0.0)? - q)?.mean_all()?;
        let value = loss.to_scalar::<f32>()?;
        check_finite("actor", value, self.check_finite)?;
        self.actor.backward_step(&loss)?;

        let loss_alpha = self.ent_coef.update(&log_pi, self.check_finite)?;

        Ok(ActorFit {
            loss_actor: value,
            loss_alpha,
        })
    }

    /// `target = tau * online + (1 - tau) * target` for every critic variable.
    pub fn soft_update(&mut self) -> Result<()> {
        track(self.critic_tgt.varmap(), self.critic.varmap(), self.tau)
    }

    /// One training step on `batch`.
    ///
    /// The critic is fit at every step. The actor and the entropy coefficient
    /// are fit, and the target critic is soft-updated, when `step` is a
    /// multiple of `policy_freq`.
    pub fn update(
        &mut self,
        batch: &TensorBatch,
        step: usize,
        keys: &MetricKeys,
        collector: &mut dyn MetricsCollector,
    ) -> Result<Record> {
        let n = batch.len();
        let goal = batch.goal.as_ref();
        let reward_sum = batch.reward.sum_all()?.to_scalar::<f32>()?;
        collector.log(keys.batch_reward, reward_sum, step, n)?;

        trace!("fit_critic()");
        let target = self.critic_target(&batch.next_state, goal, &batch.reward, &batch.not_done)?;
        let loss_critic = self.fit_critic(&batch.state, goal, &batch.action, &target)?;
        collector.log(keys.critic_loss, loss_critic * n as f32, step, n)?;

        let mut record = Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss_critic)),
            ("batch_reward", RecordValue::Scalar(reward_sum / n as f32)),
        ]);

        if step % self.policy_freq == 0 {
            trace!("fit_actor()");
            let fit = self.fit_actor(&batch.state, goal)?;
            collector.log(keys.actor_loss, fit.loss_actor * n as f32, step, n)?;
            record.insert("loss_actor", RecordValue::Scalar(fit.loss_actor));
            if let Some(loss_alpha) = fit.loss_alpha {
                record.insert("loss_alpha", RecordValue::Scalar(loss_alpha));
            }

            trace!("soft_update()");
            self.soft_update()?;
        }
        record.insert("alpha", RecordValue::Scalar(self.ent_coef.alpha()? as f32));

        Ok(record)
    }

    /// Saves the actor and the critic under `<directory>/model`.
    pub fn save(
        &self,
        directory: &Path,
        (actor_name, critic_name): (&str, &str),
        timestep: usize,
    ) -> Result<()> {
        fs::create_dir_all(directory.join("model"))?;
        self.actor
            .save(checkpoint_path(directory, actor_name, timestep))?;
        self.critic
            .save(checkpoint_path(directory, critic_name, timestep))?;
        Ok(())
    }

    /// Loads the actor and the critic saved by [`ActorCritic::save`].
    ///
    /// The target critic keeps its values.
    pub fn load(
        &mut self,
        directory: &Path,
        (actor_name, critic_name): (&str, &str),
        timestep: usize,
    ) -> Result<()> {
        self.actor
            .load(checkpoint_path(directory, actor_name, timestep))?;
        self.critic
            .load(checkpoint_path(directory, critic_name, timestep))?;
        Ok(())
    }
}
