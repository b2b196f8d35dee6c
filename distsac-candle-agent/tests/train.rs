use anyhow::Result;
use distsac_candle_agent::{
    dist_sac::{DistSac, DistSacConfig, DistanceEstimator},
    error::AgentError,
    sac::{ActorCriticConfig, GoalContext, Sac, SacConfig},
    util::snapshot,
};
use distsac_core::{record::BufferedCollector, ReplayBufferBase, StatsTracker, StdBatch};
use ndarray::{Array1, Array2};
use tempdir::TempDir;

const STATE_DIM: usize = 3;
const ACTION_DIM: usize = 2;
const BATCH_SIZE: usize = 8;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Clone)]
struct FixedBufferConfig {
    with_goal: bool,
}

/// Returns the same transitions at every call.
struct FixedBuffer {
    with_goal: bool,
}

impl FixedBuffer {
    fn obs(size: usize) -> Array2<f32> {
        Array2::from_shape_fn((size, STATE_DIM), |(i, j)| 0.1 * i as f32 - 0.05 * j as f32)
    }

    fn std_batch(size: usize) -> StdBatch {
        let obs = Self::obs(size);
        let next_obs = obs.mapv(|x| x + 0.01);
        let act = Array2::from_shape_fn((size, ACTION_DIM), |(i, j)| {
            if (i + j) % 2 == 0 {
                0.3
            } else {
                -0.3
            }
        });
        StdBatch::new(
            obs,
            act,
            next_obs,
            Array1::from_elem(size, -1.0),
            Array1::zeros(size),
        )
    }
}

impl ReplayBufferBase for FixedBuffer {
    type Config = FixedBufferConfig;
    type Batch = StdBatch;

    fn build(config: &Self::Config) -> Self {
        Self {
            with_goal: config.with_goal,
        }
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        Ok(Self::std_batch(size))
    }

    fn goal_batch(&mut self, size: usize) -> Result<Self::Batch> {
        let batch = Self::std_batch(size);
        match self.with_goal {
            true => Ok(batch.with_goal(Self::obs(size).mapv(|x| x + 0.5))),
            false => Ok(batch),
        }
    }
}

/// Returns batches whose transitions are all the same, none of them done.
struct IdenticalBuffer;

impl IdenticalBuffer {
    fn std_batch(size: usize) -> StdBatch {
        let row = |v: &[f32]| Array2::from_shape_fn((size, v.len()), |(_, j)| v[j]);
        StdBatch::new(
            row(&[0.1, -0.2, 0.3]),
            row(&[0.5, -0.5]),
            row(&[0.15, -0.2, 0.3]),
            Array1::from_elem(size, -1.0),
            Array1::zeros(size),
        )
    }
}

impl ReplayBufferBase for IdenticalBuffer {
    type Config = ();
    type Batch = StdBatch;

    fn build(_config: &Self::Config) -> Self {
        Self
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        Ok(Self::std_batch(size))
    }

    fn goal_batch(&mut self, size: usize) -> Result<Self::Batch> {
        let goal = Array2::from_shape_fn((size, STATE_DIM), |(_, j)| 1.0 - 0.5 * j as f32);
        Ok(Self::std_batch(size).with_goal(goal))
    }
}

/// Asserts that every variable holds new values.
fn assert_all_updated(before: &[(String, Vec<f32>)], after: &[(String, Vec<f32>)]) {
    assert_eq!(before.len(), after.len());
    for ((name, b), (name_, a)) in before.iter().zip(after.iter()) {
        assert_eq!(name, name_);
        assert_ne!(b, a, "{} was not updated", name);
    }
}

fn buffer(with_goal: bool) -> FixedBuffer {
    FixedBuffer::build(&FixedBufferConfig { with_goal })
}

fn actor_critic_config(goal_context: GoalContext) -> ActorCriticConfig {
    ActorCriticConfig::mlp(STATE_DIM, ACTION_DIM, goal_context)
        .batch_size(BATCH_SIZE)
        .policy_freq(1)
        .target_entropy(-(ACTION_DIM as f64))
}

fn sac(expl_coef: f64) -> Result<Sac> {
    Sac::build(
        SacConfig::mlp(STATE_DIM, ACTION_DIM)
            .actor_critic(actor_critic_config(GoalContext::None))
            .expl_coef(expl_coef),
    )
}

fn dist_sac(use_l2: bool) -> Result<DistSac> {
    DistSac::build(
        DistSacConfig::mlp(STATE_DIM, ACTION_DIM, false)
            .actor_critic(actor_critic_config(GoalContext::Full))
            .use_l2(use_l2),
    )
}

#[test]
fn test_sac_train() -> Result<()> {
    init();
    let mut agent = sac(0.0)?;
    let mut buffer = buffer(false);
    let mut collector = BufferedCollector::new();
    let actor_before = snapshot(agent.actor().varmap())?;
    let critic_before = snapshot(agent.critic().varmap())?;
    let target_before = snapshot(agent.critic_tgt().varmap())?;

    for step in 1..=3 {
        let record = agent.train(&mut buffer, step, None, &mut collector)?;
        assert!(record.get_scalar("loss_critic")?.is_finite());
        assert!(record.get_scalar("loss_actor")?.is_finite());
        assert!(record.get_scalar("loss_alpha")?.is_finite());
        assert_eq!(record.get_scalar("batch_reward")?, -1.0);
    }

    assert_ne!(snapshot(agent.actor().varmap())?, actor_before);
    assert_ne!(snapshot(agent.critic().varmap())?, critic_before);
    assert_ne!(snapshot(agent.critic_tgt().varmap())?, target_before);

    for key in ["train/batch_reward", "train/critic_loss", "train/actor_loss"].iter() {
        let values = collector.values(key);
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|v| v.n == BATCH_SIZE));
    }
    assert!(!collector.contains("train/expl_bonus"));
    assert_eq!(collector.values("train/batch_reward")[0].value, -(BATCH_SIZE as f32));
    Ok(())
}

#[test]
fn test_one_step_on_identical_transitions_updates_all_variables() -> Result<()> {
    init();
    let mut agent = sac(0.0)?;
    let mut buffer = IdenticalBuffer::build(&());
    let mut collector = BufferedCollector::new();
    let actor_before = snapshot(agent.actor().varmap())?;
    let critic_before = snapshot(agent.critic().varmap())?;

    let record = agent.train(&mut buffer, 0, None, &mut collector)?;

    assert!(record.get_scalar("loss_critic")?.is_finite());
    assert!(record.get_scalar("loss_actor")?.is_finite());
    assert_eq!(actor_before.len(), 6);
    assert_eq!(critic_before.len(), 12);
    assert_all_updated(&actor_before, &snapshot(agent.actor().varmap())?);
    assert_all_updated(&critic_before, &snapshot(agent.critic().varmap())?);

    let mut agent = DistSac::build(
        DistSacConfig::mlp(STATE_DIM, ACTION_DIM, true)
            .actor_critic(actor_critic_config(GoalContext::PositionOnly)),
    )?;
    let actor_before = snapshot(agent.actor().varmap())?;
    let critic_before = snapshot(agent.critic().varmap())?;

    let record = agent.train(&mut buffer, 0, &mut collector)?;

    assert!(record.get_scalar("loss_critic")?.is_finite());
    assert!(record.get_scalar("loss_actor")?.is_finite());
    assert_all_updated(&actor_before, &snapshot(agent.actor().varmap())?);
    assert_all_updated(&critic_before, &snapshot(agent.critic().varmap())?);
    Ok(())
}

#[test]
fn test_dist_sac_train() -> Result<()> {
    init();
    let mut agent = dist_sac(false)?;
    let mut buffer = buffer(true);
    let mut tracker = StatsTracker::with_default_window()?;
    let critic_before = snapshot(agent.critic().varmap())?;

    for step in 1..=3 {
        let record = agent.train(&mut buffer, step, &mut tracker)?;
        assert!(record.get_scalar("loss_critic")?.is_finite());
        assert!(record.get_scalar("loss_actor")?.is_finite());

        // Rewards are 0 for self goals and -1 otherwise.
        let reward = record.get_scalar("batch_reward")?;
        assert!((-1.0..=0.0).contains(&reward));
    }

    assert_ne!(snapshot(agent.critic().varmap())?, critic_before);
    assert!(tracker.compute("dist_critic_loss")?.is_finite());
    assert!(tracker.compute("dist_actor_loss")?.is_finite());
    assert!(tracker.contains("dist_train_reward"));
    Ok(())
}

#[test]
fn test_dist_sac_requires_goals() -> Result<()> {
    let mut agent = dist_sac(false)?;
    let mut buffer = buffer(false);
    let mut collector = BufferedCollector::new();

    let err = agent
        .train(&mut buffer, 1, &mut collector)
        .expect_err("a batch without goals must be rejected");
    assert!(matches!(
        err.downcast_ref::<AgentError>(),
        Some(AgentError::MissingGoal)
    ));
    Ok(())
}

#[test]
fn test_exploration_bonus() -> Result<()> {
    init();
    let expl_coef = 0.5;
    let mut agent = sac(expl_coef)?;
    let estimator = dist_sac(true)?;
    let mut buffer = buffer(false);
    let mut collector = BufferedCollector::new();

    let estimator: &dyn DistanceEstimator = &estimator;
    agent.train(&mut buffer, 1, Some(estimator), &mut collector)?;

    // Euclidean distance of the first two coordinates from the origin.
    let obs = FixedBuffer::obs(BATCH_SIZE);
    let expected: f32 = obs
        .rows()
        .into_iter()
        .map(|s| (s[0] * s[0] + s[1] * s[1]).sqrt() * expl_coef as f32)
        .sum();

    let bonus = collector.values("train/expl_bonus");
    assert_eq!(bonus.len(), 1);
    assert!((bonus[0].value - expected).abs() < 1e-4);

    let reward = collector.values("train/batch_reward");
    assert!((reward[0].value - (expected - BATCH_SIZE as f32)).abs() < 1e-4);
    Ok(())
}

#[test]
fn test_exploration_bonus_from_critic() -> Result<()> {
    let mut agent = sac(0.1)?;
    let estimator = dist_sac(false)?;
    let mut buffer = buffer(false);
    let mut collector = BufferedCollector::new();

    let estimator: &dyn DistanceEstimator = &estimator;
    let record = agent.train(&mut buffer, 2, Some(estimator), &mut collector)?;
    assert!(record.get_scalar("expl_bonus")?.is_finite());
    Ok(())
}

#[test]
fn test_exploration_bonus_requires_estimator() -> Result<()> {
    let mut agent = sac(0.5)?;
    let mut buffer = buffer(false);
    let mut collector = BufferedCollector::new();

    let err = agent
        .train(&mut buffer, 1, None, &mut collector)
        .expect_err("an exploration bonus needs a distance estimator");
    assert!(matches!(
        err.downcast_ref::<AgentError>(),
        Some(AgentError::MissingDistanceEstimator(_))
    ));
    Ok(())
}

#[test]
fn test_save_and_load() -> Result<()> {
    init();
    let dir = TempDir::new("distsac_checkpoint")?;
    let state = [0.2f32, -0.1, 0.4];
    let goal = [1.0f32, 0.5, 0.0];

    let mut agent = sac(0.0)?;
    let mut buffer = buffer(true);
    let mut collector = BufferedCollector::new();
    agent.train(&mut buffer, 1, None, &mut collector)?;
    agent.save(dir.path(), 1)?;
    assert!(dir.path().join("model").join("actor_1.safetensors").exists());
    assert!(dir.path().join("model").join("critic_1.safetensors").exists());

    let mut restored = Sac::build(
        SacConfig::mlp(STATE_DIM, ACTION_DIM)
            .actor_critic(actor_critic_config(GoalContext::None).seed(7)),
    )?;
    restored.load(dir.path(), 1)?;
    assert_eq!(restored.select_action(&state)?, agent.select_action(&state)?);
    assert_eq!(
        snapshot(restored.critic().varmap())?,
        snapshot(agent.critic().varmap())?
    );

    let mut dist_agent = dist_sac(false)?;
    dist_agent.train(&mut buffer, 1, &mut collector)?;
    dist_agent.save(dir.path(), 5)?;
    assert!(dir.path().join("model").join("dist_actor_5.safetensors").exists());

    let mut restored = DistSac::build(
        DistSacConfig::mlp(STATE_DIM, ACTION_DIM, false)
            .actor_critic(actor_critic_config(GoalContext::Full).seed(7)),
    )?;
    restored.load(dir.path(), 5)?;
    assert_eq!(
        restored.select_action(&state, &goal)?,
        dist_agent.select_action(&state, &goal)?
    );
    Ok(())
}
