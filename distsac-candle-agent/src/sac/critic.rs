//! Critic of SAC agent.
use super::GoalContext;
use crate::{
    error::AgentError,
    init::init_linear_layers,
    model::SubModel1,
    noise::NoiseSource,
    opt::{Optimizer, OptimizerConfig},
    util::hard_copy,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Critic`].
pub struct CriticConfig<Q> {
    pub q_config: Option<Q>,
    pub opt_config: OptimizerConfig,
}

impl<Q> Default for CriticConfig<Q> {
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<Q> CriticConfig<Q>
where
    Q: DeserializeOwned + Serialize,
{
    /// Sets configurations of the two action-value functions.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [CriticConfig] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [CriticConfig].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Twin critic for SAC agents.
///
/// Two action-value functions `q1` and `q2` of the same structure take the
/// state, the goal features and the action, concatenated in this order.
/// Both live in one [`VarMap`] under the prefixes `q1` and `q2` and are
/// trained by one optimizer.
pub struct Critic<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
{
    device: Device,
    varmap: VarMap,
    context: GoalContext,

    q1: Q,
    q2: Q,
    q_config: Q::Config,

    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl<Q> Critic<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    /// Constructs [`Critic`] with orthogonal weights and zero biases.
    pub fn build(
        config: CriticConfig<Q::Config>,
        context: GoalContext,
        device: Device,
        noise: &mut NoiseSource,
    ) -> Result<Critic<Q>> {
        let q_config = config
            .q_config
            .ok_or(AgentError::MissingConfig("q_config"))?;
        let critic = Self::_build(device, context, config.opt_config, q_config)?;
        init_linear_layers(&critic.varmap, noise)?;
        Ok(critic)
    }

    fn _build(
        device: Device,
        context: GoalContext,
        opt_config: OptimizerConfig,
        q_config: Q::Config,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let (q1, q2) = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            (
                Q::build(vb.pp("q1"), q_config.clone())?,
                Q::build(vb.pp("q2"), q_config.clone())?,
            )
        };
        let opt = opt_config.build(varmap.all_vars())?;

        Ok(Self {
            device,
            varmap,
            context,
            q1,
            q2,
            q_config,
            opt_config,
            opt,
        })
    }

    /// Returns a critic with its own variables holding the same values.
    ///
    /// Used to create the target critic.
    pub fn try_clone(&self) -> Result<Self> {
        let critic = Self::_build(
            self.device.clone(),
            self.context,
            self.opt_config.clone(),
            self.q_config.clone(),
        )?;
        hard_copy(&critic.varmap, &self.varmap)?;
        Ok(critic)
    }

    /// Returns `(q1, q2)`, each of shape `(batch_size, 1)`.
    pub fn forward(
        &self,
        state: &Tensor,
        goal: Option<&Tensor>,
        action: &Tensor,
    ) -> Result<(Tensor, Tensor)> {
        let x = self.context.input(state, goal)?;
        let x = Tensor::cat(&[&x, action], 1)?;
        Ok((self.q1.forward(&x)?, self.q2.forward(&x)?))
    }

    /// Returns `min(q1, q2)`.
    pub fn min_q(&self, state: &Tensor, goal: Option<&Tensor>, action: &Tensor) -> Result<Tensor> {
        let (q1, q2) = self.forward(state, goal, action)?;
        Ok(q1.minimum(&q2)?)
    }

    /// Takes an optimization step of both action-value functions on `loss`.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Returns the variables of the critic.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters as safetensors.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save critic to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters from safetensors.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load critic from {:?}", path.as_ref());
        Ok(())
    }
}
