// ============================================================
// Layer 5 — Backend Smoke Test
// ============================================================
// The smallest piece of work that proves a backend is usable:
// multiply a random 3×3 by a random 3×4 matrix on the device
// and read the result back.

use anyhow::{anyhow, bail, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    prelude::*,
    tensor::TensorData,
};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

/// Printed forms of the operands and the product.
#[derive(Debug, Clone)]
pub struct MatmulReport {
    pub backend: &'static str,
    pub mat1:    String,
    pub mat2:    String,
    pub product: String,
    /// Row-major product, read back from the device
    pub values:  Vec<f32>,
}

fn random_matrix<B: Backend>(rows: usize, cols: usize, rng: &mut StdRng, device: &B::Device) -> Tensor<B, 2> {
    let data: Vec<f32> = (0..rows * cols).map(|_| StandardNormal.sample(rng)).collect();
    Tensor::from_data(TensorData::new(data, [rows, cols]), device)
}

pub fn matmul_on<B: Backend>(backend: &'static str, device: &B::Device, seed: u64) -> Result<MatmulReport> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mat1 = random_matrix::<B>(3, 3, &mut rng, device);
    let mat2 = random_matrix::<B>(3, 4, &mut rng, device);
    let product = mat1.clone().matmul(mat2.clone());

    let values = product
        .to_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read product from {backend}: {e:?}"))?;
    if values.iter().any(|v| !v.is_finite()) {
        bail!("Backend {backend} returned a non-finite product: {values:?}");
    }

    Ok(MatmulReport {
        backend,
        mat1:    mat1.to_string(),
        mat2:    mat2.to_string(),
        product: product.to_string(),
        values,
    })
}

/// Run the matmul on the GPU (WGPU) or, with `cpu`, on NdArray.
///
/// WGPU panics when no adapter exists; that panic is turned into
/// an error so the caller can still report what it found.
pub fn run_matmul(cpu: bool, seed: u64) -> Result<MatmulReport> {
    if cpu {
        return matmul_on::<NdArray>("ndarray", &NdArrayDevice::Cpu, seed);
    }

    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        let device = WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        matmul_on::<Wgpu>("wgpu", &device, seed)
    }));
    match attempt {
        Ok(report) => report,
        Err(payload) => bail!("WGPU backend unavailable: {}", panic_message(&*payload)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
