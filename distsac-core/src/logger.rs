//! Periodic dump of tracked statistics.
use crate::{error::CoreError, StatsTracker};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    str::FromStr,
};

const TRAIN_KEYS: [&str; 20] = [
    "total_timesteps",
    "num_episodes",
    "num_target_states",
    "fps",
    "episode_timesteps",
    "train_episode_reward",
    "train_episode_timesteps",
    "train_reward",
    "dist_train_reward",
    "actor_loss",
    "critic_loss",
    "dist_actor_loss",
    "dist_critic_loss",
    "pot_diff",
    "gail_reward",
    "pot_coef",
    "train_predicted_reward",
    "reward_pearsonr",
    "gail_loss",
    "expl_bonus",
];

const EVAL_KEYS: [&str; 7] = [
    "total_timesteps",
    "num_episodes",
    "num_target_states",
    "fps",
    "episode_timesteps",
    "eval_episode_reward",
    "eval_episode_timesteps",
];

/// Output format of [`Logger`].
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One compact JSON object per line.
    Json,

    /// One `| key: value | key: value` line.
    Text,
}

impl FromStr for LogFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            _ => Err(CoreError::UnknownLogFormat(s.to_string())),
        }
    }
}

/// Writes a fixed subset of the meters of a [`StatsTracker`] as one line.
///
/// Every line starts with the `type` of the logger (e.g. `train` or `eval`)
/// followed by the configured keys in order, each rendered with the
/// [`Display`](std::fmt::Display) implementation of its meter. Lines go to
/// stdout and, if a file was given, to that file, which is truncated when
/// the logger is constructed.
pub struct Logger {
    format: LogFormat,
    log_type: String,
    keys: Vec<String>,
    log_file: Option<BufWriter<File>>,
}

impl Logger {
    /// Constructs a logger.
    pub fn new<P: AsRef<Path>>(
        format: LogFormat,
        log_type: impl Into<String>,
        keys: Vec<String>,
        file_name: Option<P>,
    ) -> Result<Self> {
        let log_file = match file_name {
            Some(path) => {
                info!("Write logs to {:?}", path.as_ref());
                Some(BufWriter::new(File::create(path)?))
            }
            None => None,
        };

        Ok(Self {
            format,
            log_type: log_type.into(),
            keys,
            log_file,
        })
    }

    /// Constructs a logger of type `train`.
    ///
    /// If `init_keys` is `None`, the keys of the default training statistics
    /// are dumped.
    pub fn train<P: AsRef<Path>>(
        format: LogFormat,
        file_name: Option<P>,
        init_keys: Option<Vec<String>>,
    ) -> Result<Self> {
        let keys = init_keys.unwrap_or_else(|| TRAIN_KEYS.iter().map(|k| k.to_string()).collect());
        Self::new(format, "train", keys, file_name)
    }

    /// Constructs a logger of type `eval`.
    ///
    /// If `init_keys` is `None`, the keys of the default evaluation statistics
    /// are dumped.
    pub fn eval<P: AsRef<Path>>(
        format: LogFormat,
        file_name: Option<P>,
        init_keys: Option<Vec<String>>,
    ) -> Result<Self> {
        let keys = init_keys.unwrap_or_else(|| EVAL_KEYS.iter().map(|k| k.to_string()).collect());
        Self::new(format, "eval", keys, file_name)
    }

    /// Returns the keys dumped by the logger.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    fn format_json(&self, stats: &[(String, String)]) -> Result<String> {
        let map: Map<String, Value> = stats
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Ok(serde_json::to_string(&map)?)
    }

    fn format_text(&self, stats: &[(String, String)]) -> String {
        let pieces: Vec<String> = stats.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        format!("| {}", pieces.join(" | "))
    }

    /// Formats the configured meters of `tracker` into a line.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::UnknownMeter`] if a configured key has no meter.
    pub fn format(&self, tracker: &StatsTracker) -> Result<String> {
        let mut stats = vec![("type".to_string(), self.log_type.clone())];
        for key in self.keys.iter() {
            stats.push((key.clone(), tracker.render(key)?));
        }

        match self.format {
            LogFormat::Json => self.format_json(&stats),
            LogFormat::Text => Ok(self.format_text(&stats)),
        }
    }

    /// Writes one line to stdout and the log file, and returns the line.
    pub fn dump(&mut self, tracker: &StatsTracker) -> Result<String> {
        let line = self.format(tracker)?;
        println!("{}", line);

        if let Some(file) = self.log_file.as_mut() {
            writeln!(file, "{}", line)?;
            file.flush()?;
        }

        Ok(line)
    }
}
