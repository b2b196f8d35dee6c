//! Orthogonal weight initialization.
//!
//! Weights of linear layers are replaced by (semi-)orthogonal matrices and
//! biases are set to zero. Variables are identified by their names.
use crate::{noise::NoiseSource, util::named_vars};
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::VarMap;
use log::trace;

/// Returns a `rows x cols` matrix in row-major order with orthonormal rows or
/// columns, whichever are fewer.
///
/// A Gaussian matrix is orthonormalized with the Gram-Schmidt process.
pub fn orthogonal(rows: usize, cols: usize, noise: &mut NoiseSource) -> Vec<f32> {
    // Orthonormalize the shorter side, vectors of length `len`.
    let (n_vecs, len) = if rows >= cols { (cols, rows) } else { (rows, cols) };
    let mut vecs: Vec<Vec<f64>> = (0..n_vecs)
        .map(|_| {
            noise
                .standard_normal_vec(len)
                .into_iter()
                .map(|x| x as f64)
                .collect()
        })
        .collect();

    for i in 0..n_vecs {
        for j in 0..i {
            let dot: f64 = vecs[i].iter().zip(&vecs[j]).map(|(a, b)| a * b).sum();
            let vj = vecs[j].clone();
            vecs[i].iter_mut().zip(&vj).for_each(|(a, b)| *a -= dot * b);
        }
        let norm = vecs[i].iter().map(|a| a * a).sum::<f64>().sqrt() + 1e-10;
        vecs[i].iter_mut().for_each(|a| *a /= norm);
    }

    let mut w = vec![0f32; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            w[r * cols + c] = if rows >= cols {
                vecs[c][r] as f32
            } else {
                vecs[r][c] as f32
            };
        }
    }
    w
}

/// Initializes the linear layers in `varmap`.
///
/// Two-dimensional variables named `*.weight` become orthogonal matrices and
/// variables named `*.bias` become zero. Variables are visited in the order of
/// their names, so the result depends only on the state of `noise`.
pub fn init_linear_layers(varmap: &VarMap, noise: &mut NoiseSource) -> Result<()> {
    for (name, var) in named_vars(varmap)? {
        let dims = var.dims().to_vec();
        if name.ends_with("weight") && dims.len() == 2 {
            trace!("orthogonal {} {:?}", name, dims);
            let w = orthogonal(dims[0], dims[1], noise);
            var.set(&Tensor::from_vec(w, (dims[0], dims[1]), var.device())?)?;
        } else if name.ends_with("bias") {
            var.set(&var.zeros_like()?)?;
        }
    }
    Ok(())
}
