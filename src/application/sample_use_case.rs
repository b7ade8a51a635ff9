// ============================================================
// Layer 2 — SampleUseCase
// ============================================================
// Re-renders the trajectory figure from a finished run without
// retraining. Sampling settings default to the ones stored in
// the run's train_config.json and can be overridden.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::ml::sampler::{run_sampling, TrajectoryManifest, VisualizeOptions};
use crate::ml::solver::{validate_step_size, OdeMethod};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Run directory written by `train`
    pub run_dir:         String,
    /// Where to write the figure (defaults to run_dir)
    pub output_dir:      Option<String>,
    pub step_size:       Option<f64>,
    pub batch_size:      Option<usize>,
    pub num_time_points: Option<usize>,
    pub method:          Option<OdeMethod>,
    pub seed:            Option<u64>,
    pub cpu:             bool,
}

impl SampleConfig {
    /// Stored training settings with this config's overrides applied.
    pub fn visualize_options(&self, train: &TrainConfig) -> VisualizeOptions {
        VisualizeOptions {
            step_size:       self.step_size.unwrap_or(train.step_size),
            batch_size:      self.batch_size.unwrap_or(train.batch_size),
            num_time_points: self.num_time_points.unwrap_or(train.num_time_points),
            method:          self.method.unwrap_or(train.method),
            seed:            self.seed.unwrap_or(train.seed),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(h) = self.step_size {
            validate_step_size(h)?;
        }
        if self.batch_size == Some(0) {
            bail!("Batch size must be at least 1");
        }
        if matches!(self.num_time_points, Some(n) if n < 2) {
            bail!("Need at least 2 time points to visualise");
        }
        Ok(())
    }
}

pub struct SampleUseCase {
    config: SampleConfig,
}

impl SampleUseCase {
    pub fn new(config: SampleConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrajectoryManifest> {
        self.config.validate()?;
        tracing::info!("Sampling from run '{}'", self.config.run_dir);
        run_sampling(&self.config)
    }
}
