// ============================================================
// Layer 2 — SmokeUseCase (GPU smoke test)
// ============================================================
// A tiny job to check that a launched task can reach its GPU:
//
//   Step 1: Read the launcher coordinates from the environment
//   Step 2: Ask what the NVIDIA driver sees         (Layer 6)
//   Step 3: Multiply two random matrices on device  (Layer 5)
//
// Without a CUDA device the matmul runs on the CPU backend.
//
// The CLI prints the report between "Started job" and
// "Finished job" lines.
//
// Intended to be listed in a launcher command-lines file.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::infra::{
    gpu::{query_gpus, GpuInventory},
    launcher::{ENV_JOB_ID, ENV_TASK_ID},
};
use crate::ml::smoke::{run_matmul, MatmulReport};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmokeConfig {
    pub job_id: i64,
    pub cpu:    bool,
    pub seed:   u64,
}

/// Everything the smoke test found out.
#[derive(Debug, Clone)]
pub struct SmokeReport {
    pub job_id:        i64,
    pub inventory:     GpuInventory,
    pub launcher_job:  Option<String>,
    pub launcher_task: Option<String>,
    pub matmul:        MatmulReport,
}

/// True when the matmul should run on NdArray: either asked for,
/// or the driver reported no GPU.
pub fn use_cpu(cpu_flag: bool, inventory: &GpuInventory) -> bool {
    cpu_flag || !inventory.cuda_available()
}

pub struct SmokeUseCase {
    config: SmokeConfig,
}

impl SmokeUseCase {
    pub fn new(config: SmokeConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<SmokeReport> {
        let cfg = &self.config;

        let launcher_job  = std::env::var(ENV_JOB_ID).ok();
        let launcher_task = std::env::var(ENV_TASK_ID).ok();
        tracing::info!("Launcher job={:?} task={:?}", launcher_job, launcher_task);

        // ── Driver view ───────────────────────────────────────────────────────
        let inventory = query_gpus();
        tracing::info!(
            "CUDA available: {} ({} device(s))",
            inventory.cuda_available(),
            inventory.device_count()
        );

        // ── Device round trip ─────────────────────────────────────────────────
        let cpu = use_cpu(cfg.cpu, &inventory);
        if cpu && !cfg.cpu {
            tracing::warn!("No CUDA device found, falling back to the CPU backend");
        }
        let matmul = run_matmul(cpu, cfg.seed)?;

        Ok(SmokeReport { job_id: cfg.job_id, inventory, launcher_job, launcher_task, matmul })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_smoke_runs() {
        let report = SmokeUseCase::new(SmokeConfig { job_id: 9, cpu: true, seed: 0 })
            .execute()
            .unwrap();
        assert_eq!(report.job_id, 9);
        assert_eq!(report.matmul.backend, "ndarray");
        assert_eq!(report.matmul.values.len(), 12);
    }

    #[test]
    fn test_backend_choice() {
        let none = GpuInventory::default();
        let one  = GpuInventory { names: vec!["NVIDIA A100".into()], visible_devices: None };

        assert!(use_cpu(false, &none));
        assert!(use_cpu(true, &one));
        assert!(!use_cpu(false, &one));
    }

    #[test]
    fn test_without_gpu_falls_back_to_cpu() {
        if query_gpus().cuda_available() {
            return;
        }
        let report = SmokeUseCase::new(SmokeConfig { job_id: 1, cpu: false, seed: 0 })
            .execute()
            .unwrap();
        assert!(!report.inventory.cuda_available());
        assert_eq!(report.matmul.backend, "ndarray");
    }
}
