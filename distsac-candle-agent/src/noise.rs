//! Explicit random source of the agents.
//!
//! candle cannot seed its CPU generator, so weight initialization,
//! reparameterized sampling and goal relabeling draw their random numbers
//! from a [`NoiseSource`] owned by the agent.
use anyhow::Result;
use candle_core::{Device, Tensor};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Seedable source of Gaussian and uniform noise.
#[derive(Clone)]
pub struct NoiseSource {
    rng: StdRng,
}

impl NoiseSource {
    /// Constructs a source from a seed.
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws `n` samples from `N(0, 1)`.
    pub fn standard_normal_vec(&mut self, n: usize) -> Vec<f32> {
        (0..n).map(|_| self.rng.sample(StandardNormal)).collect()
    }

    /// Draws `n` samples from `U[0, 1)`.
    pub fn uniform_vec(&mut self, n: usize) -> Vec<f32> {
        (0..n).map(|_| self.rng.gen::<f32>()).collect()
    }

    /// Returns a `(rows, cols)` tensor of samples from `N(0, 1)`.
    pub fn standard_normal(&mut self, rows: usize, cols: usize, device: &Device) -> Result<Tensor> {
        let v = self.standard_normal_vec(rows * cols);
        Ok(Tensor::from_vec(v, (rows, cols), device)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_noise() -> Result<()> {
        let mut n1 = NoiseSource::seed_from_u64(7);
        let mut n2 = NoiseSource::seed_from_u64(7);
        assert_eq!(n1.standard_normal_vec(16), n2.standard_normal_vec(16));
        assert_eq!(n1.uniform_vec(16), n2.uniform_vec(16));

        let t = n1.standard_normal(3, 2, &Device::Cpu)?;
        assert_eq!(t.dims(), &[3, 2]);
        Ok(())
    }

    #[test]
    fn test_uniform_range() {
        let mut noise = NoiseSource::seed_from_u64(0);
        assert!(noise
            .uniform_vec(1000)
            .iter()
            .all(|u| (0.0..1.0).contains(u)));
    }
}
