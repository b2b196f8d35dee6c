//! Replay buffer sampling contract.
mod batch;
mod replay_buffer;
pub use batch::{StdBatch, TransitionBatch};
pub use replay_buffer::ReplayBufferBase;
