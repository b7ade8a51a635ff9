// ============================================================
// Layer 5 — Sampling & Visualisation
// ============================================================
// After training (or from a saved checkpoint):
//
//   1. T = linspace(0, 1, num_time_points)
//   2. x_init ~ N(0, I), shape [batch_size, 2]
//   3. Integrate the learned field with the midpoint method,
//      keeping the state at every time in T
//   4. One 2D histogram panel per time point, written to
//      <output_path>/flow_trajectories.png
//   5. Panel times and colour limits written next to it in
//      flow_trajectories.json
//
// The ODE initial state uses its own RNG seeded from the run
// seed, so re-rendering a checkpoint gives the same figure.

use anyhow::{Context, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    prelude::*,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::sample_use_case::SampleConfig;
use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batch::{points_to_tensor, tensor_to_points},
    checkerboard::StandardGaussian,
};
use crate::domain::{
    histogram::{Histogram2d, COLOR_QUANTILE, DEFAULT_BINS, DEFAULT_RANGE},
    traits::PointSampler,
};
use crate::infra::{checkpoint::CheckpointManager, plot};
use crate::ml::model::{VelocityMlp, VelocityMlpConfig};
use crate::ml::solver::{linspace, OdeMethod, OdeSolver};

pub const FIGURE_FILE:   &str = "flow_trajectories.png";
pub const MANIFEST_FILE: &str = "flow_trajectories.json";

/// Offset between the training seed and the sampling seed so the
/// initial noise is not the first batch of training noise.
const SAMPLING_SEED_OFFSET: u64 = 1;

/// Knobs for one sampling + rendering pass.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizeOptions {
    pub step_size:       f64,
    pub batch_size:      usize,
    pub num_time_points: usize,
    pub method:          OdeMethod,
    pub seed:            u64,
}

impl From<&TrainConfig> for VisualizeOptions {
    fn from(cfg: &TrainConfig) -> Self {
        Self {
            step_size:       cfg.step_size,
            batch_size:      cfg.batch_size,
            num_time_points: cfg.num_time_points,
            method:          cfg.method,
            seed:            cfg.seed,
        }
    }
}

/// Per-panel record written alongside the figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelInfo {
    pub t:        f32,
    /// Panel title, e.g. "t= 0.33"
    pub title:    String,
    /// Upper colour limit (0.99 quantile of the bin counts)
    pub cmax:     f64,
    /// Samples that fell inside the plotted range
    pub in_range: u64,
}

/// Everything `sample_and_visualize` produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryManifest {
    pub figure:     PathBuf,
    pub batch_size: usize,
    pub step_size:  f64,
    pub method:     OdeMethod,
    pub panels:     Vec<PanelInfo>,
}

/// Sample trajectories from `model` and save the histogram figure.
/// Returns the manifest that was written next to the figure.
pub fn sample_and_visualize<B: Backend>(
    model:       &VelocityMlp<B>,
    device:      &B::Device,
    opts:        &VisualizeOptions,
    output_path: &Path,
) -> Result<TrajectoryManifest> {
    fs::create_dir_all(output_path)
        .with_context(|| format!("Cannot create output directory '{}'", output_path.display()))?;

    // ── Time grid and initial noise ───────────────────────────────────────────
    let time_grid = linspace(0.0, 1.0, opts.num_time_points);
    let mut rng   = StdRng::seed_from_u64(opts.seed.wrapping_add(SAMPLING_SEED_OFFSET));
    let x_init    = points_to_tensor::<B>(&StandardGaussian.sample(opts.batch_size, &mut rng), device);

    // ── Integrate, keeping every intermediate state ───────────────────────────
    let solver = OdeSolver::new(opts.method, Some(opts.step_size as f32));
    let sol    = solver.sample(model, x_init, &time_grid, true)?;
    let [steps, n, dim] = sol.dims();

    // ── One histogram per time point ──────────────────────────────────────────
    let mut panels = Vec::with_capacity(steps);
    let mut infos  = Vec::with_capacity(steps);
    for (i, &t) in time_grid.iter().enumerate() {
        let slice  = sol.clone().slice([i..i + 1, 0..n, 0..dim]).reshape([n, dim]);
        let points = tensor_to_points(slice).context("Cannot read ODE solution")?;

        let hist = Histogram2d::from_points(&points, DEFAULT_BINS, DEFAULT_RANGE);
        let cmax = hist.quantile(COLOR_QUANTILE);
        infos.push(PanelInfo {
            t,
            title:    format!("t= {t:.2}"),
            cmax,
            in_range: hist.total(),
        });
        panels.push(plot::Panel { hist, vmin: 0.0, vmax: cmax });
    }

    // ── Save figure and manifest ──────────────────────────────────────────────
    let figure = output_path.join(FIGURE_FILE);
    plot::save_panels(&panels, &figure)?;

    let manifest = TrajectoryManifest {
        figure:     figure.clone(),
        batch_size: opts.batch_size,
        step_size:  opts.step_size,
        method:     opts.method,
        panels:     infos,
    };
    let manifest_path = output_path.join(MANIFEST_FILE);
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("Cannot write '{}'", manifest_path.display()))?;

    println!("Visualization saved to {}", figure.display());
    Ok(manifest)
}

/// Rebuild a trained model from its run directory and re-render the figure.
pub fn run_sampling(cfg: &SampleConfig) -> Result<TrajectoryManifest> {
    if cfg.cpu {
        println!("Using cpu.");
        sample_from_checkpoint::<NdArray>(cfg, NdArrayDevice::Cpu)
    } else {
        println!("Using gpu");
        sample_from_checkpoint::<Wgpu>(cfg, WgpuDevice::default())
    }
}

fn sample_from_checkpoint<B: Backend>(cfg: &SampleConfig, device: B::Device) -> Result<TrajectoryManifest> {
    let ckpt      = CheckpointManager::open(&cfg.run_dir)?;
    let train_cfg = ckpt.load_config()?;

    let model: VelocityMlp<B> = VelocityMlpConfig::new()
        .with_hidden_dim(train_cfg.hidden_dim)
        .init(&device);
    let model = ckpt.load_model(model, &device)?;
    tracing::info!("Model loaded from '{}'", cfg.run_dir);

    let opts = cfg.visualize_options(&train_cfg);
    let output = cfg.output_dir.as_deref().unwrap_or(cfg.run_dir.as_str());
    sample_and_visualize(&model, &device, &opts, Path::new(output))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = NdArray;

    fn opts() -> VisualizeOptions {
        VisualizeOptions {
            step_size:       0.25,
            batch_size:      200,
            num_time_points: 3,
            method:          OdeMethod::Midpoint,
            seed:            42,
        }
    }

    #[test]
    fn test_writes_figure_and_manifest() {
        let dir    = tempfile::tempdir().unwrap();
        let device = NdArrayDevice::Cpu;
        let model: VelocityMlp<TestBackend> = VelocityMlpConfig::new().with_hidden_dim(8).init(&device);

        let out = dir.path().join("run");
        let manifest = sample_and_visualize(&model, &device, &opts(), &out).unwrap();

        assert!(out.join(FIGURE_FILE).exists());
        assert!(out.join(MANIFEST_FILE).exists());
        assert_eq!(manifest.panels.len(), 3);
        assert_eq!(manifest.panels[0].title, "t= 0.00");
        assert_eq!(manifest.panels[1].title, "t= 0.50");
        assert_eq!(manifest.panels[2].title, "t= 1.00");

        // Standard normal noise: nearly everything lies inside ±5
        assert!(manifest.panels[0].in_range >= 199);
    }

    #[test]
    fn test_same_seed_same_manifest() {
        let dir    = tempfile::tempdir().unwrap();
        let device = NdArrayDevice::Cpu;
        let model: VelocityMlp<TestBackend> = VelocityMlpConfig::new().with_hidden_dim(8).init(&device);

        let a = sample_and_visualize(&model, &device, &opts(), &dir.path().join("a")).unwrap();
        let b = sample_and_visualize(&model, &device, &opts(), &dir.path().join("b")).unwrap();
        assert_eq!(a.panels, b.panels);
    }
}
