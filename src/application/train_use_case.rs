// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run in order:
//
//   Step 1: Validate hyperparameters
//   Step 2: Resolve the run directory   (Layer 3 - domain)
//   Step 3: Save config                 (Layer 6 - infra)
//   Step 4: Train, checkpoint, sample   (Layer 5 - ml)
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::run_params::RunParams;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::solver::{validate_step_size, OdeMethod};
use crate::ml::trainer::{run_training, TrainSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// Serialisable so it can be saved next to the weights and used
// to rebuild the model for later sampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub lr:              f64,
    pub batch_size:      usize,
    pub step_size:       f64,
    pub iterations:      usize,
    pub print_every:     usize,
    pub hidden_dim:      usize,
    pub num_time_points: usize,
    pub output_dir:      String,
    pub seed:            u64,
    #[serde(default)]
    pub cpu:             bool,
    #[serde(default)]
    pub method:          OdeMethod,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            lr:              1e-3,
            batch_size:      50_000,
            step_size:       0.05,
            iterations:      20_001,
            print_every:     2_000,
            hidden_dim:      512,
            num_time_points: 10,
            output_dir:      "outputs".to_string(),
            seed:            42,
            cpu:             false,
            method:          OdeMethod::Midpoint,
        }
    }
}

impl TrainConfig {
    pub fn run_params(&self) -> RunParams {
        RunParams {
            lr:              self.lr,
            batch_size:      self.batch_size,
            step_size:       self.step_size,
            hidden_dim:      self.hidden_dim,
            iterations:      self.iterations,
            num_time_points: self.num_time_points,
        }
    }

    /// `<output_dir>/<run params>`
    pub fn run_dir(&self) -> PathBuf {
        Path::new(&self.output_dir).join(self.run_params().dir_name())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.lr > 0.0) || !self.lr.is_finite() {
            bail!("Learning rate must be positive, got {}", self.lr);
        }
        validate_step_size(self.step_size)?;
        if self.batch_size == 0 {
            bail!("Batch size must be at least 1");
        }
        if self.hidden_dim == 0 {
            bail!("Hidden dimension must be at least 1");
        }
        if self.print_every == 0 {
            bail!("print_every must be at least 1");
        }
        if self.num_time_points < 2 {
            bail!("Need at least 2 time points to visualise, got {}", self.num_time_points);
        }
        Ok(())
    }
}

/// Where a finished run ended up.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub run_dir: PathBuf,
    pub summary: TrainSummary,
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainOutcome> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Run directory named after the hyperparameters ─────────────
        let run_dir = cfg.run_dir();
        tracing::info!("Run directory: '{}'", run_dir.display());

        // ── Step 3: Save config for later sampling ────────────────────────────
        let ckpt_manager = CheckpointManager::create(&run_dir)?;
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::create(&run_dir)?;

        // ── Step 4: Train, checkpoint, sample and visualise (Layer 5) ─────────
        let summary = run_training(cfg, &ckpt_manager, &metrics)?;

        Ok(TrainOutcome { run_dir, summary })
    }
}
