//! Entropy coefficient of SAC.
use crate::{
    opt::{Optimizer, OptimizerConfig},
    util::{self, scalar},
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{init::Init, VarBuilder, VarMap};
use log::trace;

/// The entropy coefficient `alpha = exp(log_alpha)` of SAC.
///
/// [`EntCoef::alpha`] is a frozen value for the actor loss and the critic
/// target, while [`EntCoef::update`] differentiates through `log_alpha`.
/// Without a target entropy the coefficient stays at its initial value.
pub struct EntCoef {
    log_alpha: Tensor,
    target_entropy: Option<f64>,
    opt: Optimizer,
}

impl EntCoef {
    /// Constructs an instance of `EntCoef` with `alpha = initial_temperature`.
    pub fn new(
        initial_temperature: f64,
        target_entropy: Option<f64>,
        opt_config: OptimizerConfig,
        device: &Device,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let init = Init::Const(initial_temperature.ln());
        let log_alpha = vb.get_with_hints(1, "log_alpha", init)?;
        let opt = opt_config.build(varmap.all_vars())?;

        Ok(Self {
            log_alpha,
            target_entropy,
            opt,
        })
    }

    /// Returns the current entropy coefficient as a constant.
    pub fn alpha(&self) -> Result<f64> {
        Ok(scalar(&self.log_alpha.exp()?)? as f64)
    }

    /// Returns the target entropy.
    pub fn target_entropy(&self) -> Option<f64> {
        self.target_entropy
    }

    /// Returns the loss `mean(alpha * (-log_pi - target_entropy))` with
    /// gradients flowing into `log_alpha` only.
    pub fn loss(&self, log_pi: &Tensor, target_entropy: f64) -> Result<Tensor> {
        let coef = log_pi.affine(-1.0, -target_entropy)?.detach();
        let alpha = self.log_alpha.exp()?;
        Ok(alpha.broadcast_mul(&coef)?.mean_all()?)
    }

    /// Takes an optimization step of `log_alpha` given the log probabilities of
    /// sampled actions, if a target entropy is set.
    ///
    /// Returns the loss of the step. With `check_finite`, a non-finite loss
    /// fails before the step is taken.
    pub fn update(&mut self, log_pi: &Tensor, check_finite: bool) -> Result<Option<f32>> {
        let target_entropy = match self.target_entropy {
            Some(v) => v,
            None => return Ok(None),
        };
        let loss = self.loss(log_pi, target_entropy)?;
        let value = loss.to_scalar::<f32>()?;
        util::check_finite("alpha", value, check_finite)?;
        self.opt.backward_step(&loss)?;
        trace!("alpha = {}", self.alpha()?);

        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_alpha() -> Result<()> {
        let mut ent_coef = EntCoef::new(0.2, None, OptimizerConfig::default(), &Device::Cpu)?;
        let log_pi = Tensor::new(&[[1f32], [2.]], &Device::Cpu)?;
        assert!(ent_coef.update(&log_pi, false)?.is_none());
        assert!((ent_coef.alpha()? - 0.2).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_alpha_moves_toward_target_entropy() -> Result<()> {
        // Entropy -log_pi = -1 is below the target 0, so alpha grows.
        let mut ent_coef = EntCoef::new(0.1, Some(0.0), OptimizerConfig::default(), &Device::Cpu)?;
        let log_pi = Tensor::new(&[[1f32], [1.]], &Device::Cpu)?;
        let loss = ent_coef.update(&log_pi, false)?.unwrap();
        assert!((loss + 0.1).abs() < 1e-5);
        assert!(ent_coef.alpha()? > 0.1);

        // Entropy above the target, alpha shrinks.
        let mut ent_coef = EntCoef::new(0.1, Some(0.0), OptimizerConfig::default(), &Device::Cpu)?;
        let log_pi = Tensor::new(&[[-1f32], [-1.]], &Device::Cpu)?;
        ent_coef.update(&log_pi, false)?;
        assert!(ent_coef.alpha()? < 0.1);
        Ok(())
    }
}
