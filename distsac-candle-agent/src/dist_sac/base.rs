//! DistSAC trainer.
use super::{
    k_smallest_mean, l2_position_distance, relabel::relabel, Distance, DistSacConfig,
    DistanceEstimator,
};
use crate::{
    error::AgentError,
    mlp::Mlp,
    sac::{Actor, ActorCritic, Critic, MetricKeys, TensorBatch},
    util::{array1_to_column, array2_to_tensor},
};
use anyhow::Result;
use candle_core::Tensor;
use distsac_core::{
    record::{MetricsCollector, Record},
    ReplayBufferBase, TransitionBatch,
};
use log::trace;
use ndarray::Array2;
use std::path::Path;

const KEYS: MetricKeys = MetricKeys {
    batch_reward: "train/dist_batch_reward",
    critic_loss: "train/dist_critic_loss",
    actor_loss: "train/dist_actor_loss",
};

const CHECKPOINT_NAMES: (&str, &str) = ("dist_actor", "dist_critic");

/// Goal-conditioned SAC agent whose critic estimates distances to goals.
pub struct DistSac {
    ac: ActorCritic,
    num_candidates: usize,
    use_l2: bool,
}

impl DistSac {
    /// Constructs [`DistSac`] agent.
    pub fn build(config: DistSacConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ac: ActorCritic::build(&config.actor_critic)?,
            num_candidates: config.num_candidates,
            use_l2: config.use_l2,
        })
    }

    /// Samples a batch with goals from `buffer`, relabels it and takes one
    /// training step.
    ///
    /// Rewards and dones of the buffer are replaced by the relabeled ones.
    /// Losses and rewards are reported to `collector` under `train/dist_*` keys.
    pub fn train<R: ReplayBufferBase>(
        &mut self,
        buffer: &mut R,
        step: usize,
        collector: &mut dyn MetricsCollector,
    ) -> Result<Record> {
        let batch = buffer.goal_batch(self.ac.batch_size())?;
        let batch = self.to_tensors(&batch)?;
        trace!("DistSac::train() step {}", step);
        self.ac.update(&batch, step, &KEYS, collector)
    }

    fn to_tensors<B: TransitionBatch>(&mut self, batch: &B) -> Result<TensorBatch> {
        let traj_goals = batch.goal().ok_or(AgentError::MissingGoal)?;
        let mask_noise = self.ac.noise.uniform_vec(batch.len());
        let relabeled = relabel(batch.obs(), traj_goals, &mask_noise)?;
        let not_done = relabeled.done.mapv(|d| 1.0 - d);

        let device = &self.ac.device;
        Ok(TensorBatch {
            state: array2_to_tensor(batch.obs(), device)?,
            action: array2_to_tensor(batch.act(), device)?,
            reward: array1_to_column(&relabeled.reward, device)?,
            next_state: array2_to_tensor(batch.next_obs(), device)?,
            not_done: array1_to_column(&not_done, device)?,
            goal: Some(array2_to_tensor(&relabeled.goals, device)?),
        })
    }

    /// `-min(q1, q2)` at the deterministic action, `(batch_size, num_goals)`.
    fn critic_distance(&self, state: &Tensor, goals: &Tensor) -> Result<Tensor> {
        let (batch_size, num_goals, state_dim) = goals.dims3()?;
        let n = batch_size * num_goals;
        let states = state
            .unsqueeze(1)?
            .broadcast_as((batch_size, num_goals, state_dim))?
            .reshape((n, state_dim))?;
        let goals = goals.reshape((n, state_dim))?;

        let action = self.ac.actor.deterministic(&states, Some(&goals))?;
        let q = self.ac.critic.min_q(&states, Some(&goals), &action)?;
        Ok(q.neg()?.reshape((batch_size, num_goals))?.detach())
    }

    /// Distance from a single state to the rows of `goals`, `(num_goals, state_dim)`.
    ///
    /// Returns the mean of the nearest distances and the indices of the
    /// selected goals.
    pub fn get_distance_array(
        &self,
        state: &[f32],
        goals: &Array2<f32>,
    ) -> Result<(f32, Vec<usize>)> {
        let device = &self.ac.device;
        let (num_goals, state_dim) = goals.dim();
        let state = Tensor::from_slice(state, (1, state.len()), device)?;
        let goals = array2_to_tensor(goals, device)?.reshape((1, num_goals, state_dim))?;

        let Distance { dist, mut idxs } = self.get_distance(&state, &goals)?;
        let dist = dist.flatten_all()?.to_vec1::<f32>()?[0];
        Ok((dist, idxs.swap_remove(0)))
    }

    /// Returns the deterministic action for a single state and goal.
    pub fn select_action(&self, state: &[f32], goal: &[f32]) -> Result<Vec<f32>> {
        let device = &self.ac.device;
        let state = Tensor::from_slice(state, (1, state.len()), device)?;
        let goal = Tensor::from_slice(goal, (1, goal.len()), device)?;
        let a = self.ac.actor.deterministic(&state, Some(&goal))?;
        Ok(a.flatten_all()?.to_vec1::<f32>()?)
    }

    /// Returns the entropy coefficient.
    pub fn alpha(&self) -> Result<f64> {
        self.ac.ent_coef.alpha()
    }

    /// Returns the actor.
    pub fn actor(&self) -> &Actor<Mlp> {
        &self.ac.actor
    }

    /// Returns the critic.
    pub fn critic(&self) -> &Critic<Mlp> {
        &self.ac.critic
    }

    /// Saves the actor and the critic to
    /// `<directory>/model/{dist_actor,dist_critic}_<timestep>.safetensors`.
    pub fn save<T: AsRef<Path>>(&self, directory: T, timestep: usize) -> Result<()> {
        self.ac.save(directory.as_ref(), CHECKPOINT_NAMES, timestep)
    }

    /// Loads the actor and the critic saved by [`DistSac::save`].
    pub fn load<T: AsRef<Path>>(&mut self, directory: T, timestep: usize) -> Result<()> {
        self.ac.load(directory.as_ref(), CHECKPOINT_NAMES, timestep)
    }
}

impl DistanceEstimator for DistSac {
    fn get_distance(&self, state: &Tensor, goals: &Tensor) -> Result<Distance> {
        let dist = match self.use_l2 {
            true => l2_position_distance(state, goals)?,
            false => self.critic_distance(state, goals)?,
        };
        k_smallest_mean(&dist, self.num_candidates)
    }
}
