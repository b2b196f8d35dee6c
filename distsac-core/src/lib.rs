#![warn(missing_docs)]
//! Core interfaces of distsac.
//!
//! This crate holds everything the trainers need besides the networks:
//!
//! * [`record`] - step summaries and the metrics collector interface,
//! * [`meter`], [`StatsTracker`] and [`Logger`] - named training statistics
//!   and their periodic dump to the console or a file,
//! * the replay buffer sampling contract ([`ReplayBufferBase`],
//!   [`TransitionBatch`], [`StdBatch`]).
pub mod error;
pub mod meter;
pub mod record;

mod base;
pub use base::{ReplayBufferBase, StdBatch, TransitionBatch};

mod tracker;
pub use tracker::{StatsTracker, DEFAULT_WINDOW_SIZE};

mod logger;
pub use logger::{LogFormat, Logger};
