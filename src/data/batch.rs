// ============================================================
// Layer 4 — Flow Batch
// ============================================================
// Moves a host-side PathSample onto a Burn device.
//
//   x_t   [N, 2]   model input
//   t     [N]      model input (time conditioning)
//   dx_t  [N, 2]   regression target
//
// The points are flattened row by row and reshaped, the same
// way any fixed-width sample is stacked into a batch tensor.
//
// Reference: Burn Book §4 (Batcher)

use anyhow::{anyhow, Result};
use burn::{prelude::*, tensor::TensorData};

use crate::data::path::PathSample;
use crate::domain::traits::Point;

#[derive(Debug, Clone)]
pub struct FlowBatch<B: Backend> {
    pub x_t:  Tensor<B, 2>,
    pub t:    Tensor<B, 1>,
    pub dx_t: Tensor<B, 2>,
}

impl<B: Backend> FlowBatch<B> {
    pub fn from_path_sample(sample: &PathSample, device: &B::Device) -> Self {
        let t = Tensor::<B, 1>::from_data(
            TensorData::new(sample.t.clone(), [sample.t.len()]),
            device,
        );
        Self {
            x_t:  points_to_tensor(&sample.x_t, device),
            t,
            dx_t: points_to_tensor(&sample.dx_t, device),
        }
    }
}

/// `[N]` points → `[N, 2]` float tensor.
pub fn points_to_tensor<B: Backend>(points: &[Point], device: &B::Device) -> Tensor<B, 2> {
    let flat: Vec<f32> = points.iter().flat_map(|p| [p[0], p[1]]).collect();
    Tensor::<B, 2>::from_data(TensorData::new(flat, [points.len(), 2]), device)
}

/// `[N, 2]` float tensor → host points.
pub fn tensor_to_points<B: Backend>(tensor: Tensor<B, 2>) -> Result<Vec<Point>> {
    let flat = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))?;
    Ok(flat.chunks_exact(2).map(|c| [c[0], c[1]]).collect())
}
