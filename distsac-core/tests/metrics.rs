use anyhow::Result;
use distsac_core::{
    record::{BufferedCollector, MetricsCollector},
    LogFormat, Logger, StatsTracker,
};
use serde_json::Value;
use tempdir::TempDir;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Values logged by a trainer show up in the train logger output.
#[test]
fn test_collector_to_logger() -> Result<()> {
    init();
    let dir = TempDir::new("metrics")?;
    let path = dir.path().join("train.log");

    let mut tracker = StatsTracker::new(100)?;
    let mut logger = Logger::train(LogFormat::Json, Some(&path), None)?;

    for step in 0..4 {
        tracker.log("train/critic_loss", 10.0 * (step + 1) as f32, step, 10)?;
        tracker.log("train/batch_reward", -10.0, step, 10)?;
        tracker.update("total_timesteps", 1.0, 1)?;
    }
    let line = logger.dump(&tracker)?;

    let json: Value = serde_json::from_str(&line)?;
    assert_eq!(json["type"], "train");
    assert_eq!(json["total_timesteps"], "4");
    assert_eq!(json["critic_loss"], "2.500");
    assert_eq!(json["train_reward"], "-1.000");
    assert_eq!(json["expl_bonus"], "0.000");

    let first_key = line.trim_start_matches('{').split(':').next().unwrap();
    assert_eq!(first_key, "\"type\"");

    let content = std::fs::read_to_string(&path)?;
    assert_eq!(content.trim_end(), line);
    Ok(())
}

#[test]
fn test_buffered_collector() -> Result<()> {
    let mut collector = BufferedCollector::new();
    collector.log("train/actor_loss", 1.5, 3, 100)?;
    collector.log("train/actor_loss", 2.5, 5, 100)?;

    assert!(collector.contains("train/actor_loss"));
    assert!(!collector.contains("train/critic_loss"));
    let values: Vec<(f32, usize)> = collector
        .values("train/actor_loss")
        .iter()
        .map(|v| (v.value, v.step))
        .collect();
    assert_eq!(values, vec![(1.5, 3), (2.5, 5)]);
    Ok(())
}
