// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores a trained velocity field using Burn's
// CompactRecorder.
//
// What gets saved per run directory:
//   1. model.mpk           — all learned parameters
//   2. train_config.json   — hyperparameters of the run
//
// The config is needed to rebuild the exact architecture
// (hidden_dim) before the weights can be loaded into it.
//
// File layout:
//   outputs/lr_0.001_bs_50000_.../
//     model.mpk
//     train_config.json
//     metrics.csv
//     flow_trajectories.png
//     flow_trajectories.json
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{bail, Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{fs, path::{Path, PathBuf}};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::VelocityMlp;

/// Recorder adds its own extension (.mpk).
const MODEL_FILE:  &str = "model";
const CONFIG_FILE: &str = "train_config.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Manager for a run directory that is about to be written.
    /// Creates the directory if it does not exist yet.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create run directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Manager for an existing run directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            bail!(
                "Run directory '{}' does not exist. Have you run 'train' first?",
                dir.display()
            );
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save model weights into the run directory.
    pub fn save_model<B: Backend>(&self, model: &VelocityMlp<B>) -> Result<()> {
        let path = self.dir.join(MODEL_FILE);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        tracing::debug!("Saved model weights to '{}'", path.display());
        Ok(())
    }

    /// Load weights into `model`, which must have the saved architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  VelocityMlp<B>,
        device: &B::Device,
    ) -> Result<VelocityMlp<B>> {
        let path = self.dir.join(MODEL_FILE);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'sample'.",
                    path.display()
                )
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }
}
