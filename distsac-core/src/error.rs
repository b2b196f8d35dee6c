//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The format type of a logger is neither `json` nor `text`.
    #[error("unknown log format: {0}")]
    UnknownLogFormat(String),

    /// A meter with the given name is not registered in the tracker.
    #[error("unknown meter: {0}")]
    UnknownMeter(String),

    /// The window of a moving average must hold at least one update.
    #[error("window size must be positive, got {0}")]
    InvalidWindowSize(usize),
}
