// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one row per progress line to metrics.csv in the run
// directory:
//
//   iter,ms_per_step,loss
//   2000,3.412000,1.032114
//   4000,3.398000,0.981277
//
// Each training run starts the file over.
//
// The loss is the batch loss at that iteration, not a running
// average, so it is noisy; it should still trend downward.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One logged point of the training curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterMetrics {
    /// 1-based iteration number
    pub iter: usize,

    /// Wall-clock milliseconds per step, averaged since the last log line
    pub ms_per_step: f64,

    /// Flow-matching MSE at this iteration
    pub loss: f64,
}

impl IterMetrics {
    pub fn new(iter: usize, ms_per_step: f64, loss: f64) -> Self {
        Self { iter, ms_per_step, loss }
    }

    /// Returns true if this row improved over the best loss so far
    pub fn is_improvement(&self, best_loss: f64) -> bool {
        self.loss < best_loss
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Start a fresh metrics.csv (header only), replacing any earlier run's rows.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "iter,ms_per_step,loss")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one row.
    pub fn log(&self, m: &IterMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{},{:.6},{:.6}", m.iter, m.ms_per_step, m.loss)?;

        tracing::debug!("Logged iter {} loss={:.4}", m.iter, m.loss);
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = IterMetrics::new(2000, 3.0, 1.5);
        assert!(m.is_improvement(2.0));
        assert!(!m.is_improvement(1.0));
    }

    #[test]
    fn test_rows_append_within_a_run() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::create(dir.path()).unwrap();
        logger.log(&IterMetrics::new(1, 2.0, 3.0)).unwrap();
        logger.log(&IterMetrics::new(2, 2.5, 2.25)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec![
            "iter,ms_per_step,loss",
            "1,2.000000,3.000000",
            "2,2.500000,2.250000",
        ]);
    }

    #[test]
    fn test_new_run_truncates_old_rows() {
        let dir = tempfile::tempdir().unwrap();

        MetricsLogger::create(dir.path()).unwrap()
            .log(&IterMetrics::new(1, 2.0, 3.0)).unwrap();
        let logger = MetricsLogger::create(dir.path()).unwrap();
        logger.log(&IterMetrics::new(1, 1.0, 0.5)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec![
            "iter,ms_per_step,loss",
            "1,1.000000,0.500000",
        ]);
    }
}
