//! Batch.
use ndarray::{Array1, Array2};

/// A batch of transitions, one row per transition.
///
/// Rewards and done flags are column vectors of the batch length; a done flag
/// is `1.0` for a terminal transition and `0.0` otherwise.
pub trait TransitionBatch {
    /// Returns the number of transitions.
    fn len(&self) -> usize;

    /// Returns `true` if the batch holds no transitions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `o_t`.
    fn obs(&self) -> &Array2<f32>;

    /// Returns `a_t`.
    fn act(&self) -> &Array2<f32>;

    /// Returns `o_t+1`.
    fn next_obs(&self) -> &Array2<f32>;

    /// Returns `r_t`.
    fn reward(&self) -> &Array1<f32>;

    /// Returns `is_done_t`.
    fn is_done(&self) -> &Array1<f32>;

    /// Returns the goals of the transitions, if the batch was sampled with goals.
    fn goal(&self) -> Option<&Array2<f32>>;
}

/// A batch of transitions stored as `ndarray` arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct StdBatch {
    obs: Array2<f32>,
    act: Array2<f32>,
    next_obs: Array2<f32>,
    reward: Array1<f32>,
    is_done: Array1<f32>,
    goal: Option<Array2<f32>>,
}

impl StdBatch {
    /// Constructs a batch without goals.
    pub fn new(
        obs: Array2<f32>,
        act: Array2<f32>,
        next_obs: Array2<f32>,
        reward: Array1<f32>,
        is_done: Array1<f32>,
    ) -> Self {
        Self {
            obs,
            act,
            next_obs,
            reward,
            is_done,
            goal: None,
        }
    }

    /// Attaches goals to the batch.
    pub fn with_goal(mut self, goal: Array2<f32>) -> Self {
        self.goal = Some(goal);
        self
    }

    /// Unpacks the data `(o_t, a_t, o_t+1, r_t, is_done_t, goal)`.
    #[allow(clippy::type_complexity)]
    pub fn unpack(
        self,
    ) -> (
        Array2<f32>,
        Array2<f32>,
        Array2<f32>,
        Array1<f32>,
        Array1<f32>,
        Option<Array2<f32>>,
    ) {
        (
            self.obs,
            self.act,
            self.next_obs,
            self.reward,
            self.is_done,
            self.goal,
        )
    }
}

impl TransitionBatch for StdBatch {
    fn len(&self) -> usize {
        self.reward.len()
    }

    fn obs(&self) -> &Array2<f32> {
        &self.obs
    }

    fn act(&self) -> &Array2<f32> {
        &self.act
    }

    fn next_obs(&self) -> &Array2<f32> {
        &self.next_obs
    }

    fn reward(&self) -> &Array1<f32> {
        &self.reward
    }

    fn is_done(&self) -> &Array1<f32> {
        &self.is_done
    }

    fn goal(&self) -> Option<&Array2<f32>> {
        self.goal.as_ref()
    }
}
