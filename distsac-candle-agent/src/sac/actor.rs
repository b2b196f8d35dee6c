//! Actor of SAC agent.
use super::{
    squash::{apply_squashing_func, gaussian_likelihood, rescale_log_std, squash_correction},
    GoalContext,
};
use crate::{
    error::AgentError,
    init::init_linear_layers,
    model::SubModel1,
    noise::NoiseSource,
    opt::{Optimizer, OptimizerConfig},
    util::OutDim,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

fn default_log_std_min() -> f64 {
    -20.0
}

fn default_log_std_max() -> f64 {
    2.0
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Actor`].
pub struct ActorConfig<P> {
    pi_config: Option<P>,
    opt_config: OptimizerConfig,
    #[serde(default = "default_log_std_min")]
    log_std_min: f64,
    #[serde(default = "default_log_std_max")]
    log_std_max: f64,
}

impl<P> Default for ActorConfig<P> {
    fn default() -> Self {
        Self {
            pi_config: None,
            opt_config: OptimizerConfig::default(),
            log_std_min: default_log_std_min(),
            log_std_max: default_log_std_max(),
        }
    }
}

impl<P> ActorConfig<P>
where
    P: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for the policy network.
    ///
    /// The network outputs the mean and the raw log standard deviation,
    /// so its output dimension is twice the action dimension.
    pub fn pi_config(mut self, v: P) -> Self {
        self.pi_config = Some(v);
        self
    }

    /// Sets the action dimension.
    pub fn action_dim(mut self, v: usize) -> Self {
        if let Some(pi_config) = &mut self.pi_config {
            pi_config.set_out_dim(2 * v);
        }
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Sets the bounds of the log standard deviation.
    pub fn log_std_bounds(mut self, min: f64, max: f64) -> Self {
        self.log_std_min = min;
        self.log_std_max = max;
        self
    }

    /// Constructs [`ActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ActorConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Output of [`Actor::sample`].
pub struct SampledAction {
    /// `tanh(mu)`.
    pub mean: Tensor,

    /// `tanh(mu + noise * std)`.
    pub action: Tensor,

    /// Log probability of `action`, `(batch_size, 1)`.
    pub log_prob: Option<Tensor>,
}

/// Tanh-squashed Gaussian policy.
///
/// The network takes the state, followed by the goal features selected by
/// the [`GoalContext`].
pub struct Actor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
{
    device: Device,
    varmap: VarMap,
    context: GoalContext,

    // Dimension of the action vector.
    action_dim: usize,
    log_std_min: f64,
    log_std_max: f64,

    pi: P,
    opt: Optimizer,
}

impl<P> Actor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`Actor`] with orthogonal weights and zero biases.
    pub fn build(
        config: ActorConfig<P::Config>,
        context: GoalContext,
        device: Device,
        noise: &mut NoiseSource,
    ) -> Result<Actor<P>> {
        let pi_config = config
            .pi_config
            .ok_or(AgentError::MissingConfig("pi_config"))?;
        let action_dim = pi_config.get_out_dim() / 2;
        let varmap = VarMap::new();
        let pi = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            P::build(vb, pi_config)?
        };
        init_linear_layers(&varmap, noise)?;
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            device,
            varmap,
            context,
            action_dim,
            log_std_min: config.log_std_min,
            log_std_max: config.log_std_max,
            pi,
            opt,
        })
    }

    /// Returns `mu` and the rescaled log standard deviation.
    fn forward(&self, state: &Tensor, goal: Option<&Tensor>) -> Result<(Tensor, Tensor)> {
        let x = self.context.input(state, goal)?;
        let out = self.pi.forward(&x)?;
        let chunks = out.chunk(2, D::Minus1)?;
        debug_assert_eq!(chunks[0].dims()[1], self.action_dim);
        let log_std = rescale_log_std(&chunks[1], self.log_std_min, self.log_std_max)?;
        Ok((chunks[0].clone(), log_std))
    }

    /// Returns the deterministic action `tanh(mu)`.
    pub fn deterministic(&self, state: &Tensor, goal: Option<&Tensor>) -> Result<Tensor> {
        let (mu, _) = self.forward(state, goal)?;
        let (mean, _, _) = apply_squashing_func(&mu, None, None)?;
        Ok(mean)
    }

    /// Samples an action with reparameterization, `noise ~ N(0, I)` drawn from `noise`.
    ///
    /// The log probability is computed only if `with_log_prob` is `true`.
    pub fn sample(
        &self,
        state: &Tensor,
        goal: Option<&Tensor>,
        noise: &mut NoiseSource,
        with_log_prob: bool,
    ) -> Result<SampledAction> {
        let (mu, log_std) = self.forward(state, goal)?;
        let (batch_size, action_dim) = mu.dims2()?;
        let eps = noise.standard_normal(batch_size, action_dim, &self.device)?;
        let pi = (&mu + (&eps * log_std.exp()?)?)?;
        let mean = mu.tanh()?;
        let action = pi.tanh()?;
        let log_prob = match with_log_prob {
            true => {
                let log_pi = gaussian_likelihood(&eps, &log_std)?;
                Some((log_pi - squash_correction(&action)?)?)
            }
            false => None,
        };

        Ok(SampledAction {
            mean,
            action,
            log_prob,
        })
    }

    /// Returns the action dimension.
    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    /// Returns the variables of the actor.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Takes an optimization step of the actor on `loss`.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Saves the parameters as safetensors.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save actor to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters from safetensors.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load actor from {:?}", path.as_ref());
        Ok(())
    }
}
