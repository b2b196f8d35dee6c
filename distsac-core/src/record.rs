//! Step summaries and the metrics collector interface.
//!
//! A trainer reports its scalar results in two ways:
//!
//! * every `train` call returns a [`Record`] summarizing the step,
//! * the same values are sent to a [`MetricsCollector`], keyed by fixed
//!   names such as `train/critic_loss` and weighted by the number of
//!   transitions they were computed from.
//!
//! ```rust
//! use distsac_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("loss_critic", RecordValue::Scalar(0.5));
//! record.insert("phase", RecordValue::String("train".to_string()));
//! assert_eq!(record.get_scalar("loss_critic").unwrap(), 0.5);
//! ```
mod base;
mod buffered_collector;
mod collector;
mod null_collector;

pub use base::{Record, RecordValue};
pub use buffered_collector::{BufferedCollector, LoggedValue};
pub use collector::MetricsCollector;
pub use null_collector::NullCollector;
