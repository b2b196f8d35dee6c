//! Tanh-squashed Gaussian distribution.
//!
//! A policy outputs the mean `mu` and the log standard deviation of a Gaussian.
//! An action is sampled as `pi = mu + noise * exp(log_std)` and squashed by
//! `tanh`. The log density of the squashed action is the Gaussian log density
//! of `noise` minus the log Jacobian of `tanh`.
use crate::error::AgentError;
use anyhow::Result;
use candle_core::{Tensor, D};

/// Added to `1 - tanh(pi)^2` before taking the log.
pub const SQUASH_EPS: f64 = 1e-6;

/// Rescales the raw log standard deviation into `[log_std_min, log_std_max]`.
///
/// `log_std = min + 0.5 * (max - min) * (tanh(raw) + 1)`
pub fn rescale_log_std(raw: &Tensor, log_std_min: f64, log_std_max: f64) -> Result<Tensor> {
    let half_range = 0.5 * (log_std_max - log_std_min);
    Ok(raw.tanh()?.affine(half_range, log_std_min + half_range)?)
}

/// Log density of `noise` under `N(0, diag(exp(log_std)^2))`, summed over the last dimension.
///
/// The result has shape `(batch_size, 1)`.
pub fn gaussian_likelihood(noise: &Tensor, log_std: &Tensor) -> Result<Tensor> {
    let d = noise.dim(D::Minus1)? as f64;
    let pre_sum = (noise.sqr()?.affine(-0.5, 0.0)? - log_std)?;
    let log_2pi = (2.0 * std::f64::consts::PI).ln();
    Ok(pre_sum.sum_keepdim(D::Minus1)?.affine(1.0, -0.5 * log_2pi * d)?)
}

/// Log Jacobian of `tanh` at a squashed action `pi`, summed over the last dimension.
///
/// `sum(log(relu(1 - pi^2) + 1e-6))`
pub fn squash_correction(pi: &Tensor) -> Result<Tensor> {
    Ok(pi
        .sqr()?
        .affine(-1.0, 1.0)?
        .relu()?
        .affine(1.0, SQUASH_EPS)?
        .log()?
        .sum_keepdim(D::Minus1)?)
}

/// Squashes the mean, the sample and corrects the log probability.
///
/// Returns `(tanh(mu), tanh(pi), log_pi - squash_correction(tanh(pi)))`.
/// A log probability can only be corrected together with its sample.
pub fn apply_squashing_func(
    mu: &Tensor,
    pi: Option<&Tensor>,
    log_pi: Option<&Tensor>,
) -> Result<(Tensor, Option<Tensor>, Option<Tensor>)> {
    let mu = mu.tanh()?;
    let pi = pi.map(|pi| pi.tanh()).transpose()?;
    let log_pi = match (log_pi, &pi) {
        (None, _) => None,
        (Some(_), None) => return Err(AgentError::LogProbWithoutSample.into()),
        (Some(log_pi), Some(pi)) => Some((log_pi - squash_correction(pi)?)?),
    };
    Ok((mu, pi, log_pi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_log_std_within_bounds() -> Result<()> {
        let raw = Tensor::new(&[[-1e4f32, -3., 0., 3., 1e4]], &Device::Cpu)?;
        for (min, max) in [(-20.0, 2.0), (-5.0, -1.0), (0.0, 0.5)].iter() {
            let log_std = rescale_log_std(&raw, *min, *max)?.to_vec2::<f32>()?;
            assert!(log_std[0]
                .iter()
                .all(|x| *x >= *min as f32 && *x <= *max as f32));
            assert!((log_std[0][0] - *min as f32).abs() < 1e-5);
            assert!((log_std[0][4] - *max as f32).abs() < 1e-5);
            assert!((log_std[0][2] - 0.5 * (*min + *max) as f32).abs() < 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_gaussian_likelihood() -> Result<()> {
        // Standard normal in two dimensions at the origin.
        let noise = Tensor::new(&[[0f32, 0.]], &Device::Cpu)?;
        let log_std = Tensor::new(&[[0f32, 0.]], &Device::Cpu)?;
        let logp = gaussian_likelihood(&noise, &log_std)?.to_vec2::<f32>()?;
        let expected = -(2.0 * std::f32::consts::PI).ln();
        assert!((logp[0][0] - expected).abs() < 1e-5);

        // N(0, e^2) at noise 1 in one dimension.
        let noise = Tensor::new(&[[1f32]], &Device::Cpu)?;
        let log_std = Tensor::new(&[[1f32]], &Device::Cpu)?;
        let logp = gaussian_likelihood(&noise, &log_std)?.to_vec2::<f32>()?;
        let expected = -0.5 - 1.0 - 0.5 * (2.0 * std::f32::consts::PI).ln();
        assert!((logp[0][0] - expected).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_correction_at_zero_mean() -> Result<()> {
        let mu = Tensor::new(&[[0f32]], &Device::Cpu)?;
        let log_pi = Tensor::new(&[[0f32]], &Device::Cpu)?;
        let (mu, pi, log_pi) = apply_squashing_func(&mu, Some(&mu), Some(&log_pi))?;

        assert_eq!(mu.to_vec2::<f32>()?, vec![vec![0.0]]);
        assert_eq!(pi.unwrap().to_vec2::<f32>()?, vec![vec![0.0]]);
        let log_pi = log_pi.unwrap().to_vec2::<f32>()?[0][0];
        assert!((log_pi + 1e-6).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_correction_matches_formula() -> Result<()> {
        let mu = [0.3f32, -1.2];
        let t = Tensor::new(&[mu], &Device::Cpu)?;
        let (_, pi, log_pi) = apply_squashing_func(&t, Some(&t), Some(&t.zeros_like()?.sum_keepdim(1)?))?;

        let expected: f32 = mu
            .iter()
            .map(|m| (1.0 - m.tanh().powi(2) + 1e-6).ln())
            .sum();
        assert_eq!(pi.unwrap().dims(), &[1, 2]);
        assert!((log_pi.unwrap().to_vec2::<f32>()?[0][0] + expected).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_log_prob_requires_sample() -> Result<()> {
        let mu = Tensor::new(&[[0.5f32]], &Device::Cpu)?;
        let log_pi = Tensor::new(&[[0f32]], &Device::Cpu)?;
        assert!(apply_squashing_func(&mu, None, Some(&log_pi)).is_err());

        let (_, pi, log_pi) = apply_squashing_func(&mu, None, None)?;
        assert!(pi.is_none() && log_pi.is_none());
        Ok(())
    }
}
