// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Flow-matching training with Adam. Per iteration:
//
//   1. x_1 ~ checkerboard,  x_0 ~ N(0, I),  t ~ U[0, 1)
//   2. (x_t, dx_t) = AffinePath(CondOT).sample(t, x_0, x_1)
//   3. loss = mean((v(x_t, t) - dx_t)²)
//   4. backward + Adam step
//
// Every `print_every` iterations one progress line is printed
// and appended to metrics.csv:
//
//   | iter   2000 |  3.41 ms/step | loss    1.032
//
// Backends:
//   - GPU: Autodiff<Wgpu>     (default)
//   - CPU: Autodiff<NdArray>  (--cpu)
// The loop itself is generic over any AutodiffBackend, which is
// also how the tests run it on the CPU.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam,
//            Lipman et al. (2023) Flow Matching for Generative Modeling

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, SeedableRng};
use std::time::Instant;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batch::FlowBatch,
    checkerboard::{uniform_times, Checkerboard, StandardGaussian},
    path::{AffinePath, CondOtScheduler},
};
use crate::domain::traits::PointSampler;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{IterMetrics, MetricsLogger},
};
use crate::ml::model::{VelocityMlp, VelocityMlpConfig};
use crate::ml::sampler::{sample_and_visualize, VisualizeOptions};

type GpuBackend = Autodiff<Wgpu>;
type CpuBackend = Autodiff<NdArray>;

/// What a finished training run reports back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainSummary {
    pub iterations: usize,
    /// Loss at the last iteration (NaN when no iteration ran)
    pub final_loss: f64,
    /// Lowest loss among the logged iterations
    pub best_loss:  f64,
}

/// Train, checkpoint and visualise on the backend chosen by `cfg.cpu`.
/// Everything is written into the checkpoint manager's run directory.
pub fn run_training(
    cfg:          &TrainConfig,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
) -> Result<TrainSummary> {
    if cfg.cpu {
        println!("Using cpu.");
        train_and_sample::<CpuBackend>(cfg, NdArrayDevice::Cpu, ckpt_manager, metrics)
    } else {
        println!("Using gpu");
        let device = WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        train_and_sample::<GpuBackend>(cfg, device, ckpt_manager, metrics)
    }
}

fn train_and_sample<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    device:       B::Device,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
) -> Result<TrainSummary> {
    let (model, summary) = train_loop::<B>(cfg, &device, Some(metrics))?;

    ckpt_manager.save_model(&model)?;
    tracing::info!("Checkpoint saved to '{}'", ckpt_manager.dir().display());

    // Sampling needs no gradients: drop to the inner backend.
    let model_valid = model.valid();
    sample_and_visualize(&model_valid, &device, &VisualizeOptions::from(cfg), ckpt_manager.dir())?;

    Ok(summary)
}

/// The flow-matching optimisation loop.
pub fn train_loop<B: AutodiffBackend>(
    cfg:     &TrainConfig,
    device:  &B::Device,
    metrics: Option<&MetricsLogger>,
) -> Result<(VelocityMlp<B>, TrainSummary)> {

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: VelocityMlp<B> = VelocityMlpConfig::new()
        .with_hidden_dim(cfg.hidden_dim)
        .init(device);
    tracing::info!("Model ready: 5 linear layers, hidden_dim={}", cfg.hidden_dim);

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().init();

    let path     = AffinePath::new(CondOtScheduler);
    let mut rng  = StdRng::seed_from_u64(cfg.seed);
    let mut start      = Instant::now();
    let mut final_loss = f64::NAN;
    let mut best_loss  = f64::INFINITY;

    for i in 0..cfg.iterations {
        // ── Sample (x_0, x_1) pairs and per-sample times ──────────────────────
        let x_1 = Checkerboard.sample(cfg.batch_size, &mut rng);
        let x_0 = StandardGaussian.sample(cfg.batch_size, &mut rng);
        let t   = uniform_times(cfg.batch_size, &mut rng);

        let sample = path.sample(&t, &x_0, &x_1)?;
        let batch  = FlowBatch::<B>::from_path_sample(&sample, device);

        // ── Forward, backward, Adam update ────────────────────────────────────
        let loss  = model.forward_loss(batch);
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optim.step(cfg.lr, model, grads);

        let iter     = i + 1;
        let log_now  = iter % cfg.print_every == 0;
        let last     = iter == cfg.iterations;
        if !(log_now || last) {
            continue;
        }

        // Reading the loss forces a device sync, so only do it when needed.
        let loss_val: f64 = loss.into_scalar().elem::<f64>();
        final_loss = loss_val;

        if log_now {
            let ms_per_step = start.elapsed().as_secs_f64() * 1000.0 / cfg.print_every as f64;
            println!(
                "| iter {:6} | {:5.2} ms/step | loss {:8.3}",
                iter, ms_per_step, loss_val,
            );
            let row = IterMetrics::new(iter, ms_per_step, loss_val);
            if row.is_improvement(best_loss) {
                best_loss = row.loss;
            }
            if let Some(logger) = metrics {
                logger.log(&row)?;
            }
            start = Instant::now();
        }
    }

    tracing::info!(
        "Training complete after {} iterations (best logged loss {:.3})",
        cfg.iterations, best_loss
    );
    Ok((model, TrainSummary { iterations: cfg.iterations, final_loss, best_loss }))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = Autodiff<NdArray>;

    fn tiny_config() -> TrainConfig {
        TrainConfig {
            lr:          1e-2,
            batch_size:  256,
            iterations:  60,
            print_every: 20,
            hidden_dim:  32,
            cpu:         true,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_loss_decreases() {
        let device = NdArrayDevice::Cpu;

        let mut short = tiny_config();
        short.iterations = 1;
        let (_, before) = train_loop::<TestBackend>(&short, &device, None).unwrap();

        let (_, after) = train_loop::<TestBackend>(&tiny_config(), &device, None).unwrap();

        assert!(before.final_loss.is_finite());
        assert!(after.final_loss.is_finite());
        assert!(
            after.final_loss < before.final_loss,
            "loss did not improve: {} -> {}", before.final_loss, after.final_loss
        );
    }

    #[test]
    fn test_metrics_rows_written_every_interval() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::create(dir.path()).unwrap();
        let cfg    = tiny_config();

        let (_, summary) = train_loop::<TestBackend>(&cfg, &NdArrayDevice::Cpu, Some(&logger)).unwrap();
        assert_eq!(summary.iterations, 60);
        assert!(summary.best_loss.is_finite());

        let csv = std::fs::read_to_string(logger.csv_path()).unwrap();
        // header + 60 / 20 rows
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.lines().nth(1).unwrap().starts_with("20,"));
    }

    #[test]
    fn test_zero_iterations_returns_untrained_model() {
        let mut cfg = tiny_config();
        cfg.iterations = 0;
        let (_, summary) = train_loop::<TestBackend>(&cfg, &NdArrayDevice::Cpu, None).unwrap();
        assert_eq!(summary.iterations, 0);
        assert!(summary.final_loss.is_nan());
    }
}
