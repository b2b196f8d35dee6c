//! Named meters of a training run.
use crate::{
    error::CoreError,
    meter::{AverageMeter, IntegerMeter, Meter, MovingAverageMeter},
    record::MetricsCollector,
};
use anyhow::Result;
use log::{debug, trace};
use std::collections::HashMap;
use xxhash_rust::xxh3::Xxh3Builder;

/// Meters averaged over the whole run.
const AVERAGE_METERS: [&str; 9] = [
    "train_episode_reward",
    "train_episode_timesteps",
    "eval_episode_reward",
    "eval_episode_timesteps",
    "train_loss",
    "valid_loss",
    "pot_coef",
    "num_target_states",
    "fps",
];

/// Meters averaged over a window of recent updates.
const MOVING_AVERAGE_METERS: [&str; 15] = [
    "train_reward",
    "dist_train_reward",
    "train_predicted_reward",
    "reward_pearsonr",
    "actor_loss",
    "critic_loss",
    "dist_actor_loss",
    "dist_critic_loss",
    "policy_loss",
    "gail_loss",
    "flow_loss",
    "pot_loss",
    "pot_diff",
    "gail_reward",
    "expl_bonus",
];

/// Integer counters.
const INTEGER_METERS: [&str; 4] = [
    "total_timesteps",
    "num_episodes",
    "episode_timesteps",
    "epoch",
];

/// Window of the moving average meters of [`StatsTracker::with_default_window`].
pub const DEFAULT_WINDOW_SIZE: usize = 1000;

/// Prefix of the keys sent by trainers through [`MetricsCollector`].
const COLLECTOR_PREFIX: &str = "train/";

/// Returns the meter name receiving a collector key.
///
/// `train/batch_reward` and `train/dist_batch_reward` feed the reward meters;
/// other keys lose their `train/` prefix.
fn meter_name(key: &str) -> &str {
    match key.strip_prefix(COLLECTOR_PREFIX).unwrap_or(key) {
        "batch_reward" => "train_reward",
        "dist_batch_reward" => "dist_train_reward",
        name => name,
    }
}

/// A set of named meters.
///
/// [`StatsTracker::new`] registers the default meters of a training run.
/// As a [`MetricsCollector`], the tracker routes trainer metrics to its
/// meters, creating a [`MovingAverageMeter`] for names it has not seen.
#[derive(Debug)]
pub struct StatsTracker {
    window_size: usize,
    meters: HashMap<String, Box<dyn Meter>, Xxh3Builder>,
}

impl StatsTracker {
    /// Constructs a tracker with the default meters.
    ///
    /// `window_size` is the window of the moving average meters. Fails with
    /// [`CoreError::InvalidWindowSize`] if it is zero.
    pub fn new(window_size: usize) -> Result<Self, CoreError> {
        let mut tracker = Self::empty(window_size)?;

        for name in AVERAGE_METERS.iter() {
            tracker.register(*name, Box::new(AverageMeter::new()));
        }
        for name in MOVING_AVERAGE_METERS.iter() {
            tracker.register(*name, Box::new(MovingAverageMeter::new(window_size)?));
        }
        for name in INTEGER_METERS.iter() {
            tracker.register(*name, Box::new(IntegerMeter::new()));
        }

        Ok(tracker)
    }

    /// Constructs a tracker with the default meters and [`DEFAULT_WINDOW_SIZE`].
    pub fn with_default_window() -> Result<Self, CoreError> {
        Self::new(DEFAULT_WINDOW_SIZE)
    }

    /// Constructs a tracker without meters.
    pub fn empty(window_size: usize) -> Result<Self, CoreError> {
        if window_size == 0 {
            return Err(CoreError::InvalidWindowSize(window_size));
        }
        Ok(Self {
            window_size,
            meters: HashMap::default(),
        })
    }

    /// Registers a meter, replacing any meter of the same name.
    pub fn register(&mut self, name: impl Into<String>, meter: Box<dyn Meter>) {
        self.meters.insert(name.into(), meter);
    }

    /// Resets the meter `name`, or all meters if `name` is `None`.
    pub fn reset(&mut self, name: Option<&str>) -> Result<(), CoreError> {
        match name {
            None => {
                self.meters.values_mut().for_each(|m| m.reset());
                Ok(())
            }
            Some(name) => {
                self.get_mut(name)?.reset();
                Ok(())
            }
        }
    }

    /// Updates the meter `name`.
    pub fn update(&mut self, name: &str, value: f64, n: usize) -> Result<(), CoreError> {
        self.get_mut(name)?.update(value, n);
        Ok(())
    }

    /// Returns the meter `name`.
    pub fn get(&self, name: &str) -> Option<&dyn Meter> {
        self.meters.get(name).map(|m| m.as_ref())
    }

    /// Returns the current value of the meter `name`.
    pub fn compute(&self, name: &str) -> Result<f64, CoreError> {
        self.get(name)
            .map(|m| m.compute())
            .ok_or_else(|| CoreError::UnknownMeter(name.to_string()))
    }

    /// Returns the meter `name` rendered as text.
    pub fn render(&self, name: &str) -> Result<String, CoreError> {
        self.get(name)
            .map(|m| m.to_string())
            .ok_or_else(|| CoreError::UnknownMeter(name.to_string()))
    }

    /// Returns `true` if a meter named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.meters.contains_key(name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Box<dyn Meter>, CoreError> {
        self.meters
            .get_mut(name)
            .ok_or_else(|| CoreError::UnknownMeter(name.to_string()))
    }
}

impl MetricsCollector for StatsTracker {
    fn log(&mut self, key: &str, value: f32, step: usize, n: usize) -> Result<()> {
        let name = meter_name(key);
        trace!("{} <- {} (step {}, n {})", name, value, step, n);

        if !self.meters.contains_key(name) {
            debug!("Create moving average meter {}", name);
            let meter = MovingAverageMeter::new(self.window_size)?;
            self.register(name, Box::new(meter));
        }
        self.update(name, value as f64, n)?;

        Ok(())
    }
}
