// ============================================================
// Layer 6 — Node-Local GPU Task Launcher
// ============================================================
// Runs every line of a command-lines file as a shell command,
// at most one task per GPU at a time:
//
//   gpus_per_node = 3
//
//   slot 0 ── task 0 ──── task 3 ── task 5
//   slot 1 ── task 1 ── task 4 ─────
//   slot 2 ── task 2 ───────────
//
// Each slot is one thread of a rayon pool sized to the number
// of GPUs; the pool's thread index IS the GPU index. A child
// process sees only its GPU and its launcher coordinates:
//
//   CUDA_VISIBLE_DEVICES = <slot>
//   LAUNCHER_JID         = <job id>
//   LAUNCHER_TSK_ID      = <task id>
//
// stdout / stderr of task N go to <workdir>/outN / <workdir>/errN.
// The workdir must not exist yet so runs never mix their logs.
//
// Reference: rayon ThreadPoolBuilder, std::process::Command

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::{
    fs::{self, File},
    io::ErrorKind,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::Instant,
};

use crate::domain::task::{parse_command_lines, DebugFlags, LaunchTask, TaskOutcome};

pub const ENV_JOB_ID:  &str = "LAUNCHER_JID";
pub const ENV_TASK_ID: &str = "LAUNCHER_TSK_ID";
pub const ENV_GPU:     &str = "CUDA_VISIBLE_DEVICES";

/// Job id for this launch: the scheduler's job id when running
/// under SLURM, otherwise our own process id.
pub fn current_job_id() -> String {
    std::env::var("SLURM_JOB_ID").unwrap_or_else(|_| std::process::id().to_string())
}

pub struct GpuLauncher {
    tasks:         Vec<LaunchTask>,
    gpus_per_node: usize,
    debug:         DebugFlags,
    workdir:       PathBuf,
    job_id:        String,
}

impl GpuLauncher {
    /// Read tasks from `commands_file` and prepare a fresh workdir.
    pub fn from_file(
        commands_file: impl AsRef<Path>,
        gpus_per_node: usize,
        debug:         DebugFlags,
        workdir:       Option<PathBuf>,
    ) -> Result<Self> {
        let commands_file = commands_file.as_ref();
        let text = fs::read_to_string(commands_file)
            .with_context(|| format!("Cannot read command lines from '{}'", commands_file.display()))?;
        let tasks = parse_command_lines(&text);

        let job_id  = current_job_id();
        let workdir = workdir.unwrap_or_else(|| PathBuf::from(format!("launcher_out{job_id}")));
        Self::new(tasks, gpus_per_node, debug, workdir, job_id)
    }

    pub fn new(
        tasks:         Vec<LaunchTask>,
        gpus_per_node: usize,
        debug:         DebugFlags,
        workdir:       PathBuf,
        job_id:        String,
    ) -> Result<Self> {
        if gpus_per_node == 0 {
            bail!("gpus_per_node must be at least 1");
        }
        if tasks.is_empty() {
            bail!("No commands to run");
        }
        if let Some(parent) = workdir.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }
        // create_dir fails atomically if another launch got there first
        match fs::create_dir(&workdir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => bail!(
                "Launcher workdir '{}' already exists; it must be unique per run",
                workdir.display()
            ),
            Err(e) => {
                return Err(e).with_context(|| format!("Cannot create workdir '{}'", workdir.display()))
            }
        }

        Ok(Self { tasks, gpus_per_node, debug, workdir, job_id })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Run every task; returns outcomes in task id order.
    /// A task failing is reported in its outcome, not as an error;
    /// errors mean a task could not be started at all.
    pub fn run(&self) -> Result<Vec<TaskOutcome>> {
        let slots = self.gpus_per_node.min(self.tasks.len());
        if self.debug.job {
            tracing::info!(
                "Job {}: {} tasks on {} GPU slots, workdir '{}', debug={}",
                self.job_id, self.tasks.len(), slots, self.workdir.display(), self.debug
            );
        }
        if self.debug.ssh {
            tracing::info!("Single node launch: tasks run locally, no remote shell");
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(slots)
            .thread_name(|i| format!("gpu-slot-{i}"))
            .build()
            .context("Cannot build launcher thread pool")?;

        let started = Instant::now();
        let outcomes: Vec<TaskOutcome> = pool.install(|| {
            self.tasks
                .par_iter()
                .with_max_len(1)
                .map(|task| {
                    let slot = rayon::current_thread_index().unwrap_or(0);
                    self.run_task(slot, task)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        if self.debug.job {
            let failed = outcomes.iter().filter(|o| !o.success()).count();
            tracing::info!(
                "Job {} finished in {:.1}s: {} succeeded, {} failed",
                self.job_id,
                started.elapsed().as_secs_f64(),
                outcomes.len() - failed,
                failed,
            );
        }
        Ok(outcomes)
    }

    fn run_task(&self, slot: usize, task: &LaunchTask) -> Result<TaskOutcome> {
        let out_path = self.workdir.join(format!("out{}", task.id));
        let err_path = self.workdir.join(format!("err{}", task.id));
        let stdout = File::create(&out_path)
            .with_context(|| format!("Cannot create '{}'", out_path.display()))?;
        let stderr = File::create(&err_path)
            .with_context(|| format!("Cannot create '{}'", err_path.display()))?;

        if self.debug.host {
            tracing::info!("Task {} → GPU slot {}", task.id, slot);
        }
        if self.debug.exec {
            tracing::info!("Task {} exec: {}", task.id, task.command);
        }
        if self.debug.task {
            tracing::info!("Task {} started", task.id);
        }

        let started = Instant::now();
        let status = Command::new("sh")
            .arg("-c")
            .arg(&task.command)
            .env(ENV_GPU, slot.to_string())
            .env(ENV_JOB_ID, &self.job_id)
            .env(ENV_TASK_ID, task.id.to_string())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .with_context(|| format!("Cannot start task {}: '{}'", task.id, task.command))?;

        let outcome = TaskOutcome {
            task_id:   task.id,
            slot,
            exit_code: status.code(),
            elapsed:   started.elapsed(),
        };

        if self.debug.task {
            tracing::info!(
                "Task {} finished on slot {} with {:?} after {:.2}s",
                task.id, slot, outcome.exit_code, outcome.elapsed.as_secs_f64()
            );
        }
        if !outcome.success() {
            tracing::warn!("Task {} failed, see '{}'", task.id, err_path.display());
        }
        Ok(outcome)
    }
}
