//! SAC trainer.
use super::{Actor, ActorCritic, Critic, GoalContext, MetricKeys, SacConfig, TensorBatch};
use crate::{
    dist_sac::DistanceEstimator,
    error::AgentError,
    mlp::Mlp,
    util::{array1_to_column, array2_to_tensor},
};
use anyhow::Result;
use candle_core::{DType, Tensor};
use distsac_core::{
    record::{MetricsCollector, Record, RecordValue},
    ReplayBufferBase, TransitionBatch,
};
use log::trace;
use std::path::Path;

const KEYS: MetricKeys = MetricKeys {
    batch_reward: "train/batch_reward",
    critic_loss: "train/critic_loss",
    actor_loss: "train/actor_loss",
};

const CHECKPOINT_NAMES: (&str, &str) = ("actor", "critic");

/// Soft actor critic (SAC) agent.
///
/// Networks take the state only. Optionally, a [`DistanceEstimator`] turns the
/// distance of each state from the origin into an exploration bonus added to
/// the rewards of the batch.
pub struct Sac {
    ac: ActorCritic,
    expl_coef: f64,
    dist_threshold: f64,
}

impl Sac {
    /// Constructs [`Sac`] agent.
    pub fn build(config: SacConfig) -> Result<Self> {
        if config.actor_critic.goal_context != GoalContext::None {
            return Err(AgentError::InvalidConfig(
                "SAC networks do not take goals".to_string(),
            )
            .into());
        }

        Ok(Self {
            ac: ActorCritic::build(&config.actor_critic)?,
            expl_coef: config.expl_coef,
            dist_threshold: config.dist_threshold,
        })
    }

    /// Samples a batch from `buffer` and takes one training step.
    ///
    /// `dist_policy` is required if `expl_coef > 0`. Losses and rewards are
    /// reported to `collector` under `train/*` keys, weighted by the batch size.
    pub fn train<R: ReplayBufferBase>(
        &mut self,
        buffer: &mut R,
        step: usize,
        dist_policy: Option<&dyn DistanceEstimator>,
        collector: &mut dyn MetricsCollector,
    ) -> Result<Record> {
        let batch = buffer.batch(self.ac.batch_size())?;
        let mut batch = self.to_tensors(&batch)?;

        let mut record = Record::empty();
        if self.expl_coef > 0.0 {
            let dist_policy =
                dist_policy.ok_or(AgentError::MissingDistanceEstimator(self.expl_coef))?;
            let bonus = self.exploration_bonus(&batch.state, dist_policy)?;
            let n = batch.len();
            let bonus_sum = bonus.sum_all()?.to_scalar::<f32>()?;
            collector.log("train/expl_bonus", bonus_sum, step, n)?;
            record.insert("expl_bonus", RecordValue::Scalar(bonus_sum / n as f32));
            batch.reward = (&batch.reward + bonus)?;
        }

        trace!("Sac::train() step {}", step);
        Ok(record.merge(self.ac.update(&batch, step, &KEYS, collector)?))
    }

    /// `expl_coef` times the distance of each state to the zero goal.
    fn exploration_bonus(
        &self,
        state: &Tensor,
        dist_policy: &dyn DistanceEstimator,
    ) -> Result<Tensor> {
        let (batch_size, state_dim) = state.dims2()?;
        let ctx = Tensor::zeros((batch_size, 1, state_dim), DType::F32, state.device())?;
        let dist = dist_policy.get_distance(state, &ctx)?.dist;
        Ok(dist.affine(self.expl_coef, 0.0)?.detach())
    }

    fn to_tensors<B: TransitionBatch>(&self, batch: &B) -> Result<TensorBatch> {
        let device = &self.ac.device;
        let not_done = batch.is_done().mapv(|d| 1.0 - d);
        Ok(TensorBatch {
            state: array2_to_tensor(batch.obs(), device)?,
            action: array2_to_tensor(batch.act(), device)?,
            reward: array1_to_column(batch.reward(), device)?,
            next_state: array2_to_tensor(batch.next_obs(), device)?,
            not_done: array1_to_column(&not_done, device)?,
            goal: None,
        })
    }

    fn state_row(&self, state: &[f32]) -> Result<Tensor> {
        Ok(Tensor::from_slice(state, (1, state.len()), &self.ac.device)?)
    }

    /// Returns the deterministic action `tanh(mu)` for a single state.
    pub fn select_action(&self, state: &[f32]) -> Result<Vec<f32>> {
        let a = self.ac.actor.deterministic(&self.state_row(state)?, None)?;
        Ok(a.flatten_all()?.to_vec1::<f32>()?)
    }

    /// Returns a sampled action for a single state.
    pub fn sample_action(&mut self, state: &[f32]) -> Result<Vec<f32>> {
        let state = self.state_row(state)?;
        let s = self.ac.actor.sample(&state, None, &mut self.ac.noise, false)?;
        Ok(s.action.flatten_all()?.to_vec1::<f32>()?)
    }

    /// Returns `min(q1, q2)` of the online critic at sampled actions, averaged
    /// over `num_samples` samples, for each row of `state`.
    pub fn get_value(&mut self, state: &Tensor, num_samples: usize) -> Result<Tensor> {
        let mut values = Vec::with_capacity(num_samples);
        for _ in 0..num_samples {
            let s = self.ac.actor.sample(state, None, &mut self.ac.noise, false)?;
            values.push(self.ac.critic.min_q(state, None, &s.action)?.detach());
        }
        Ok(Tensor::cat(&values, 1)?.mean(1)?)
    }

    /// Returns the entropy coefficient.
    pub fn alpha(&self) -> Result<f64> {
        self.ac.ent_coef.alpha()
    }

    /// Returns the configured distance threshold.
    ///
    /// The update itself does not use it.
    pub fn dist_threshold(&self) -> f64 {
        self.dist_threshold
    }

    /// Returns the actor.
    pub fn actor(&self) -> &Actor<Mlp> {
        &self.ac.actor
    }

    /// Returns the critic.
    pub fn critic(&self) -> &Critic<Mlp> {
        &self.ac.critic
    }

    /// Returns the target critic.
    pub fn critic_tgt(&self) -> &Critic<Mlp> {
        &self.ac.critic_tgt
    }

    /// Saves the actor and the critic to
    /// `<directory>/model/{actor,critic}_<timestep>.safetensors`.
    pub fn save<T: AsRef<Path>>(&self, directory: T, timestep: usize) -> Result<()> {
        self.ac.save(directory.as_ref(), CHECKPOINT_NAMES, timestep)
    }

    /// Loads the actor and the critic saved by [`Sac::save`].
    pub fn load<T: AsRef<Path>>(&mut self, directory: T, timestep: usize) -> Result<()> {
        self.ac.load(directory.as_ref(), CHECKPOINT_NAMES, timestep)
    }
}
