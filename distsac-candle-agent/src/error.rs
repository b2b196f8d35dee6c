//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum AgentError {
    /// A loss became NaN or infinite while the finite check was enabled.
    #[error("non-finite {name} loss: {value}")]
    NonFiniteLoss {
        /// Name of the loss.
        name: &'static str,
        /// Value of the loss.
        value: f32,
    },

    /// A network configuration was not given.
    #[error("{0} is not set")]
    MissingConfig(&'static str),

    /// A goal-conditioned network was called without goals.
    #[error("goal-conditioned network called without goals")]
    MissingGoal,

    /// The log probability of an action was requested without sampling it.
    #[error("log probability requires a sampled action")]
    LogProbWithoutSample,

    /// An exploration bonus was configured without a distance estimator.
    #[error("expl_coef is {0} but no distance estimator was given")]
    MissingDistanceEstimator(f64),

    /// A configuration value is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Goals or mask noise of a batch do not match its states.
    #[error("batch of {states:?} states has {goals:?} goals and {masks} mask values")]
    GoalShapeMismatch {
        /// `(batch_size, state_dim)` of the states.
        states: (usize, usize),
        /// `(batch_size, state_dim)` of the goals.
        goals: (usize, usize),
        /// Number of mask values.
        masks: usize,
    },
}
