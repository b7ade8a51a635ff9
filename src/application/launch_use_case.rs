// ============================================================
// Layer 2 — LaunchUseCase
// ============================================================
// Runs a command-lines file through the GPU launcher and
// collects the outcomes. The CLI turns any failed task into a
// non-zero exit.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::task::{DebugFlags, TaskOutcome};
use crate::infra::launcher::GpuLauncher;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// File with one shell command per line
    pub commands_file: String,
    pub gpus_per_node: usize,
    /// `+`-separated debug categories, e.g. "host+job"
    pub debug:         String,
    /// Output directory; must be unique per run
    pub workdir:       Option<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            commands_file: "gpucommandlines".to_string(),
            gpus_per_node: 3,
            debug:         "host+job".to_string(),
            workdir:       None,
        }
    }
}

/// Result of one launcher job.
#[derive(Debug, Clone)]
pub struct LaunchReport {
    pub job_id:   String,
    pub workdir:  PathBuf,
    pub outcomes: Vec<TaskOutcome>,
}

impl LaunchReport {
    /// Ids of tasks that did not exit with status 0.
    pub fn failed(&self) -> Vec<usize> {
        self.outcomes.iter().filter(|o| !o.success()).map(|o| o.task_id).collect()
    }
}

pub struct LaunchUseCase {
    config: LaunchConfig,
}

impl LaunchUseCase {
    pub fn new(config: LaunchConfig) -> Self {
        Self { config }
    }

    /// Runs every task. Failed tasks are reported, not returned as
    /// errors; `LaunchReport::failed` lists them.
    pub fn execute(&self) -> Result<LaunchReport> {
        let cfg = &self.config;
        let debug: DebugFlags = cfg.debug.parse()?;

        let launcher = GpuLauncher::from_file(
            &cfg.commands_file,
            cfg.gpus_per_node,
            debug,
            cfg.workdir.as_ref().map(PathBuf::from),
        )?;
        tracing::info!(
            "Launching {} tasks from '{}' (job {})",
            launcher.task_count(), cfg.commands_file, launcher.job_id()
        );

        let outcomes = launcher.run()?;
        Ok(LaunchReport {
            job_id:  launcher.job_id().to_string(),
            workdir: launcher.workdir().to_path_buf(),
            outcomes,
        })
    }
}
