use anyhow::Result;
use candle_core::{Tensor, D};

/// Summary of the distances from each state to its candidate goals.
#[derive(Debug)]
pub struct Distance {
    /// Mean of the `k` smallest distances of each state, `(batch_size, 1)`.
    pub dist: Tensor,

    /// Indices of the selected candidates of each state, nearest first.
    pub idxs: Vec<Vec<usize>>,
}

/// Estimates distances between states and goals.
pub trait DistanceEstimator {
    /// Returns the distances from `state`, `(batch_size, state_dim)`, to the
    /// candidate goals `goals`, `(batch_size, num_goals, state_dim)`.
    fn get_distance(&self, state: &Tensor, goals: &Tensor) -> Result<Distance>;
}

/// Euclidean distance over the first two coordinates, `(batch_size, num_goals)`.
pub fn l2_position_distance(state: &Tensor, goals: &Tensor) -> Result<Tensor> {
    let pos = state.narrow(1, 0, 2)?.unsqueeze(1)?;
    let goal_pos = goals.narrow(2, 0, 2)?;
    Ok(pos
        .broadcast_sub(&goal_pos)?
        .sqr()?
        .sum(D::Minus1)?
        .sqrt()?)
}

/// Selects the `min(num_candidates, num_goals)` smallest distances of each
/// row of `dist`, `(batch_size, num_goals)`, and averages them.
///
/// Ties keep the order of the candidates.
pub fn k_smallest_mean(dist: &Tensor, num_candidates: usize) -> Result<Distance> {
    let rows = dist.to_vec2::<f32>()?;
    let mut means = Vec::with_capacity(rows.len());
    let mut idxs = Vec::with_capacity(rows.len());

    for row in rows.iter() {
        let k = num_candidates.min(row.len());
        let mut order: Vec<usize> = (0..row.len()).collect();
        order.sort_by(|&i, &j| row[i].total_cmp(&row[j]));
        order.truncate(k);
        means.push(order.iter().map(|&i| row[i]).sum::<f32>() / k as f32);
        idxs.push(order);
    }

    Ok(Distance {
        dist: Tensor::from_vec(means, (rows.len(), 1), dist.device())?,
        idxs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_l2_position_distance() -> Result<()> {
        let state = Tensor::new(&[[0f32, 0.]], &Device::Cpu)?;
        let goals = Tensor::new(&[[[3f32, 4.], [1., 0.]]], &Device::Cpu)?;
        let dist = l2_position_distance(&state, &goals)?;
        assert_eq!(dist.to_vec2::<f32>()?, vec![vec![5.0, 1.0]]);

        let d = k_smallest_mean(&dist, 1)?;
        assert_eq!(d.dist.to_vec2::<f32>()?, vec![vec![1.0]]);
        assert_eq!(d.idxs, vec![vec![1]]);
        Ok(())
    }

    #[test]
    fn test_l2_ignores_trailing_coordinates() -> Result<()> {
        let state = Tensor::new(&[[1f32, 1., 100.]], &Device::Cpu)?;
        let goals = Tensor::new(&[[[1f32, 2., -100.]]], &Device::Cpu)?;
        let dist = l2_position_distance(&state, &goals)?;
        assert_eq!(dist.to_vec2::<f32>()?, vec![vec![1.0]]);
        Ok(())
    }

    #[test]
    fn test_num_candidates_is_clamped() -> Result<()> {
        let dist = Tensor::new(&[[4f32, 2., 6.], [1., 1., 0.]], &Device::Cpu)?;

        let d = k_smallest_mean(&dist, 2)?;
        assert_eq!(d.dist.to_vec2::<f32>()?, vec![vec![3.0], vec![0.5]]);
        assert_eq!(d.idxs, vec![vec![1, 0], vec![2, 0]]);

        let d = k_smallest_mean(&dist, 10)?;
        assert_eq!(d.dist.to_vec2::<f32>()?, vec![vec![4.0], vec![2.0 / 3.0]]);
        assert_eq!(d.idxs[0].len(), 3);
        Ok(())
    }
}
