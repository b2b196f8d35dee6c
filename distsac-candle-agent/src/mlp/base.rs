use super::MlpConfig;
use crate::model::SubModel1;
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder};

/// Returns vector of linear modules from [`MlpConfig`].
fn create_linear_layers(prefix: &str, vs: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let mut dims = vec![config.in_dim];
    dims.extend(config.units.iter().copied());
    dims.push(config.out_dim);
    let vs = vs.pp(prefix);

    let layers = dims
        .windows(2)
        .enumerate()
        .map(|(i, w)| linear(w[0], w[1], vs.pp(format!("ln{}", i))))
        .collect::<candle_core::Result<Vec<_>>>()?;

    Ok(layers)
}

/// Multilayer perceptron with ReLU activation function.
///
/// The output layer is linear.
pub struct Mlp {
    device: Device,
    layers: Vec<Linear>,
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let n_layers = self.layers.len();
        let mut xs = xs.to_device(&self.device)?;

        for layer in self.layers[..n_layers - 1].iter() {
            xs = layer.forward(&xs)?.relu()?;
        }

        Ok(self.layers[n_layers - 1].forward(&xs)?)
    }

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vs.device().clone();
        let layers = create_linear_layers("mlp", vs, &config)?;

        Ok(Self { device, layers })
    }
}
