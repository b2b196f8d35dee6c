//! Optimizers.
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::Optimizer as _;
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Configuration of optimizer for training neural networks in an RL agent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },
}

impl OptimizerConfig {
    /// Constructs an optimizer updating `vars`.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::Adam { lr } => {
                let params = ParamsAdam {
                    lr: *lr,
                    ..ParamsAdam::default()
                };
                let opt = Adam::new(vars, params)?;
                Ok(Optimizer::Adam(opt))
            }
        }
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::Adam { lr: _ } => Self::Adam { lr },
        }
    }
}

impl Default for OptimizerConfig {
    /// Adam with learning rate `1e-3`.
    fn default() -> Self {
        Self::Adam { lr: 1e-3 }
    }
}

/// Optimizers.
pub enum Optimizer {
    /// Adam optimizer.
    Adam(Adam),
}

impl Optimizer {
    /// Computes the gradients of `loss` and updates the variables of this optimizer.
    ///
    /// Variables outside of the optimizer receive gradients but are left untouched.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::Adam(opt) => Ok(opt.backward_step(loss)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_backward_step_updates_own_vars() -> Result<()> {
        let x = Var::new(&[1f32, 2.], &Device::Cpu)?;
        let y = Var::new(&[3f32], &Device::Cpu)?;
        let mut opt = OptimizerConfig::default().build(vec![x.clone()])?;

        let loss = (x.as_tensor().sum_all()? + y.as_tensor().sum_all()?)?;
        opt.backward_step(&loss)?;

        let x_ = x.as_tensor().to_vec1::<f32>()?;
        assert!(x_[0] < 1.0 && x_[1] < 2.0);
        assert_eq!(y.as_tensor().to_vec1::<f32>()?, vec![3.0]);
        Ok(())
    }

    #[test]
    fn test_yaml_roundtrip() -> Result<()> {
        let config = OptimizerConfig::default().learning_rate(3e-4);
        assert_eq!(config, OptimizerConfig::Adam { lr: 3e-4 });

        let yaml = serde_yaml::to_string(&config)?;
        let config_: OptimizerConfig = serde_yaml::from_str(&yaml)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
