//! Utilities.
use crate::error::AgentError;
use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor, Var};
use candle_nn::VarMap;
use log::trace;
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: usize);
}

/// Returns the variables in `varmap` sorted by name.
///
/// The returned variables share their storage with the ones in `varmap`.
pub fn named_vars(varmap: &VarMap) -> Result<Vec<(String, Var)>> {
    let data = varmap
        .data()
        .lock()
        .map_err(|e| anyhow!("poisoned variable map: {}", e))?;
    let mut vars: Vec<(String, Var)> = data.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    vars.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(vars)
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    let src: HashMap<String, Var> = named_vars(src)?.into_iter().collect();

    for (name, v_dest) in named_vars(dest)? {
        trace!("track {}", name);
        let v_src = src
            .get(&name)
            .ok_or_else(|| anyhow!("{} is not in the source variables", name))?;
        let t_dest = ((v_src.as_tensor() * tau)? + (v_dest.as_tensor() * (1.0 - tau))?)?;
        v_dest.set(&t_dest)?;
    }

    Ok(())
}

/// Copies the values of the variables in `src` into the variables of the same
/// names in `dest`.
///
/// Unlike [`VarMap::clone_from`], `dest` keeps its own storage.
pub fn hard_copy(dest: &VarMap, src: &VarMap) -> Result<()> {
    let src: HashMap<String, Var> = named_vars(src)?.into_iter().collect();

    for (name, v_dest) in named_vars(dest)? {
        let v_src = src
            .get(&name)
            .ok_or_else(|| anyhow!("{} is not in the source variables", name))?;
        v_dest.set(&v_src.as_tensor().copy()?)?;
    }

    Ok(())
}

/// Returns the values of the variables in `varmap`, sorted by name.
pub fn snapshot(varmap: &VarMap) -> Result<Vec<(String, Vec<f32>)>> {
    named_vars(varmap)?
        .into_iter()
        .map(|(k, v)| -> Result<(String, Vec<f32>)> {
            Ok((k, v.as_tensor().flatten_all()?.to_vec1::<f32>()?))
        })
        .collect()
}

/// Converts a matrix into a `(rows, cols)` tensor.
pub fn array2_to_tensor(a: &Array2<f32>, device: &Device) -> Result<Tensor> {
    let v = a.iter().copied().collect::<Vec<_>>();
    Ok(Tensor::from_vec(v, a.dim(), device)?)
}

/// Converts a vector into a `(len, 1)` tensor.
pub fn array1_to_column(a: &Array1<f32>, device: &Device) -> Result<Tensor> {
    let v = a.iter().copied().collect::<Vec<_>>();
    Ok(Tensor::from_vec(v, (a.len(), 1), device)?)
}

/// Fails with [`AgentError::NonFiniteLoss`] if `enabled` and `value` is NaN or infinite.
pub fn check_finite(name: &'static str, value: f32, enabled: bool) -> Result<()> {
    if enabled && !value.is_finite() {
        return Err(AgentError::NonFiniteLoss { name, value }.into());
    }
    Ok(())
}

/// Returns the single value of a tensor with one element.
pub fn scalar(t: &Tensor) -> Result<f32> {
    Ok(t.flatten_all()?.to_vec1::<f32>()?[0])
}
