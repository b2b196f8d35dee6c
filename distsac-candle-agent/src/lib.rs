//! SAC agents implemented with [candle](https://crates.io/crates/candle-core).
//!
//! * [`sac::Sac`] - soft actor-critic with a tanh-squashed Gaussian policy,
//!   a twin critic and an entropy coefficient,
//! * [`dist_sac::DistSac`] - its goal-conditioned variant, whose critic is
//!   also used as a distance between states and goals.
pub mod dist_sac;
pub mod error;
pub mod init;
pub mod mlp;
pub mod model;
pub mod noise;
pub mod opt;
pub mod sac;
pub mod util;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The GPU device with the given ordinal.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl TryFrom<Device> for candle_core::Device {
    type Error = candle_core::Error;

    fn try_from(device: Device) -> Result<Self, Self::Error> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}
