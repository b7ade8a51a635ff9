// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and all their flags:
//
//   train   — fit the velocity field, save it, render trajectories
//   sample  — re-render trajectories from a saved run
//   smoke   — GPU smoke test job
//   launch  — run a command-lines file across the node's GPUs
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    launch_use_case::LaunchConfig,
    sample_use_case::SampleConfig,
    smoke_use_case::SmokeConfig,
    train_use_case::TrainConfig,
};
use crate::ml::solver::OdeMethod;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a flow-matching velocity field on the 2D checkerboard
    Train(TrainArgs),

    /// Sample and visualise trajectories from a trained run
    Sample(SampleArgs),

    /// Check that this job can see and use its GPU
    Smoke(SmokeArgs),

    /// Run every line of a command-lines file, one task per GPU
    Launch(LaunchArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Learning rate for the Adam optimiser
    #[arg(long, default_value_t = 0.001)]
    pub lr: f64,

    /// Batch size for training and ODE sampling
    #[arg(long, default_value_t = 50_000)]
    pub batch_size: usize,

    /// Step size for the ODE solver
    #[arg(long, default_value_t = 0.05)]
    pub step_size: f64,

    /// Number of training iterations
    #[arg(long, default_value_t = 20_001)]
    pub iterations: usize,

    /// Print a progress line every N iterations
    #[arg(long, default_value_t = 2_000)]
    pub print_every: usize,

    /// Hidden dimension of the MLP
    #[arg(long, default_value_t = 512)]
    pub hidden_dim: usize,

    /// Number of time points (figure panels) for ODE sampling
    #[arg(long, default_value_t = 10)]
    pub num_time_points: usize,

    /// Directory that receives one sub-directory per run
    #[arg(long, default_value = "outputs")]
    pub output_dir: String,

    /// Random seed for data, noise and time sampling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// ODE integration method used for sampling
    #[arg(long, value_enum, default_value_t = OdeMethod::Midpoint)]
    pub method: OdeMethod,

    /// Run on the CPU (NdArray) instead of the GPU (WGPU)
    #[arg(long)]
    pub cpu: bool,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            lr:              a.lr,
            batch_size:      a.batch_size,
            step_size:       a.step_size,
            iterations:      a.iterations,
            print_every:     a.print_every,
            hidden_dim:      a.hidden_dim,
            num_time_points: a.num_time_points,
            output_dir:      a.output_dir,
            seed:            a.seed,
            cpu:             a.cpu,
            method:          a.method,
        }
    }
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Run directory written by `train`
    #[arg(long)]
    pub run_dir: String,

    /// Write the figure here instead of into the run directory
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Override the stored ODE step size
    #[arg(long)]
    pub step_size: Option<f64>,

    /// Override the stored number of samples
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override the stored number of time points
    #[arg(long)]
    pub num_time_points: Option<usize>,

    /// Override the stored ODE method
    #[arg(long, value_enum)]
    pub method: Option<OdeMethod>,

    /// Override the stored seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run on the CPU (NdArray) instead of the GPU (WGPU)
    #[arg(long)]
    pub cpu: bool,
}

impl From<SampleArgs> for SampleConfig {
    fn from(a: SampleArgs) -> Self {
        SampleConfig {
            run_dir:         a.run_dir,
            output_dir:      a.output_dir,
            step_size:       a.step_size,
            batch_size:      a.batch_size,
            num_time_points: a.num_time_points,
            method:          a.method,
            seed:            a.seed,
            cpu:             a.cpu,
        }
    }
}

#[derive(Args, Debug)]
pub struct SmokeArgs {
    /// Job id to report at start and end
    #[arg(long, default_value_t = 0)]
    pub job_id: i64,

    /// Seed for the random matrices
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Multiply on the CPU (NdArray) instead of the GPU (WGPU)
    #[arg(long)]
    pub cpu: bool,
}

impl From<SmokeArgs> for SmokeConfig {
    fn from(a: SmokeArgs) -> Self {
        SmokeConfig { job_id: a.job_id, cpu: a.cpu, seed: a.seed }
    }
}

#[derive(Args, Debug)]
pub struct LaunchArgs {
    /// File with one shell command per line
    #[arg(long, default_value = "gpucommandlines")]
    pub commands: String,

    /// Concurrent tasks, one per GPU
    #[arg(long, default_value_t = 3)]
    pub gpus_per_node: usize,

    /// Debug output, any of host+exec+task+job+ssh
    #[arg(long, default_value = "host+job")]
    pub debug: String,

    /// Output directory, must be unique per run
    #[arg(long)]
    pub workdir: Option<String>,
}

impl From<LaunchArgs> for LaunchConfig {
    fn from(a: LaunchArgs) -> Self {
        LaunchConfig {
            commands_file: a.commands,
            gpus_per_node: a.gpus_per_node,
            debug:         a.debug,
            workdir:       a.workdir,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::parse_from(["flow-matching-2d", "train"]);
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        let def = TrainConfig::default();
        assert_eq!(cfg.lr, def.lr);
        assert_eq!(cfg.batch_size, def.batch_size);
        assert_eq!(cfg.step_size, def.step_size);
        assert_eq!(cfg.iterations, def.iterations);
        assert_eq!(cfg.print_every, def.print_every);
        assert_eq!(cfg.hidden_dim, def.hidden_dim);
        assert_eq!(cfg.num_time_points, def.num_time_points);
        assert_eq!(cfg.output_dir, def.output_dir);
        assert_eq!(cfg.seed, def.seed);
        assert!(!cfg.cpu);
    }

    #[test]
    fn test_sample_overrides() {
        let cli = Cli::parse_from([
            "flow-matching-2d", "sample", "--run-dir", "outputs/run", "--method", "rk4", "--cpu",
        ]);
        let Commands::Sample(args) = cli.command else { panic!("expected sample") };
        let cfg: SampleConfig = args.into();
        assert_eq!(cfg.method, Some(OdeMethod::Rk4));
        assert_eq!(cfg.step_size, None);
        assert!(cfg.cpu);
    }

    #[test]
    fn test_launch_defaults() {
        let cli = Cli::parse_from(["flow-matching-2d", "launch"]);
        let Commands::Launch(args) = cli.command else { panic!("expected launch") };
        let cfg: LaunchConfig = args.into();
        let def = LaunchConfig::default();
        assert_eq!(cfg.commands_file, def.commands_file);
        assert_eq!(cfg.gpus_per_node, def.gpus_per_node);
        assert_eq!(cfg.debug, def.debug);
    }
}
