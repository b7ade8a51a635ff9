// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, hands a plain config to the
// matching use case, and prints the results. All work is
// delegated to Layer 2 (application).
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{bail, Result};
use clap::Parser;
use commands::{Commands, LaunchArgs, SampleArgs, SmokeArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "flow-matching-2d",
    version,
    about = "Train a flow-matching model on a 2D checkerboard, visualise its trajectories, and launch GPU jobs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => run_train(args),
            Commands::Sample(args) => run_sample(args),
            Commands::Smoke(args)  => run_smoke(args),
            Commands::Launch(args) => run_launch(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training for {} iterations", args.iterations);
    let outcome = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training complete. Final loss {:.3}. Run saved in '{}'.",
        outcome.summary.final_loss,
        outcome.run_dir.display()
    );
    Ok(())
}

fn run_sample(args: SampleArgs) -> Result<()> {
    use crate::application::sample_use_case::SampleUseCase;

    let manifest = SampleUseCase::new(args.into()).execute()?;
    for panel in &manifest.panels {
        tracing::info!("{}: colour max {:.1}, {} points in range", panel.title, panel.cmax, panel.in_range);
    }
    Ok(())
}

fn run_smoke(args: SmokeArgs) -> Result<()> {
    use crate::application::smoke_use_case::SmokeUseCase;

    println!("Started job with id {}", args.job_id);
    let report = SmokeUseCase::new(args.into()).execute()?;

    let inv = &report.inventory;
    println!("CUDA available: {}", inv.cuda_available());
    if let Some(current) = inv.current_device() {
        println!("CUDA device count: {}", inv.device_count());
        println!("CUDA device name: {}", inv.names[current]);
        println!("CUDA current device: {current}");
    }
    if let Some(visible) = &inv.visible_devices {
        println!("CUDA_VISIBLE_DEVICES: {visible}");
    }
    if let (Some(job), Some(task)) = (&report.launcher_job, &report.launcher_task) {
        println!("Launcher job {job}, task {task}");
    }

    let m = &report.matmul;
    println!("Backend: {}", m.backend);
    println!("mat1: {}", m.mat1);
    println!("mat2: {}", m.mat2);
    println!("mat1 @ mat2 {}", m.product);

    println!("Finished job with id {}", report.job_id);
    Ok(())
}

fn run_launch(args: LaunchArgs) -> Result<()> {
    use crate::application::launch_use_case::LaunchUseCase;

    let report = LaunchUseCase::new(args.into()).execute()?;
    for o in &report.outcomes {
        let exit = o.exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
        println!(
            "task {:>4} | gpu {} | exit {:>6} | {:8.2}s",
            o.task_id, o.slot, exit, o.elapsed.as_secs_f64(),
        );
    }
    println!("Job {}: task output in '{}'", report.job_id, report.workdir.display());

    let failed = report.failed();
    if !failed.is_empty() {
        bail!("{} of {} tasks failed: {:?}", failed.len(), report.outcomes.len(), failed);
    }
    Ok(())
}
