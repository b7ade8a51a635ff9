// ============================================================
// Layer 3 — Run Parameters
// ============================================================
// The subset of training hyperparameters that identifies a run.
// Every run writes its checkpoint and figures to a directory
// named after these values, so two runs with different settings
// never overwrite each other:
//
//   outputs/lr_0.001_bs_50000_step_0.05_hidden_512_iter_20001_ntp_10/
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// Hyperparameters that make up a run directory name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    pub lr:              f64,
    pub batch_size:      usize,
    pub step_size:       f64,
    pub hidden_dim:      usize,
    pub iterations:      usize,
    pub num_time_points: usize,
}

impl RunParams {
    /// Directory name for this run, e.g.
    /// `lr_0.001_bs_50000_step_0.05_hidden_512_iter_20001_ntp_10`
    pub fn dir_name(&self) -> String {
        format!(
            "lr_{}_bs_{}_step_{}_hidden_{}_iter_{}_ntp_{}",
            format_float(self.lr),
            self.batch_size,
            format_float(self.step_size),
            self.hidden_dim,
            self.iterations,
            self.num_time_points,
        )
    }
}

/// Shortest round-trip decimal, always with a decimal point.
/// Rust prints `1.0_f64` as "1"; directory names keep "1.0".
pub fn format_float(v: f64) -> String {
    let s = format!("{v}");
    if v.is_finite() && !s.contains('.') && !s.contains('e') {
        format!("{s}.0")
    } else {
        s
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> RunParams {
        RunParams {
            lr:              0.001,
            batch_size:      50_000,
            step_size:       0.05,
            hidden_dim:      512,
            iterations:      20_001,
            num_time_points: 10,
        }
    }

    #[test]
    fn test_default_dir_name() {
        assert_eq!(
            defaults().dir_name(),
            "lr_0.001_bs_50000_step_0.05_hidden_512_iter_20001_ntp_10"
        );
    }

    #[test]
    fn test_integral_floats_keep_decimal_point() {
        let p = RunParams { lr: 1.0, step_size: 2.0, ..defaults() };
        assert!(p.dir_name().starts_with("lr_1.0_bs_50000_step_2.0_"));
    }

    #[test]
    fn test_format_float_small_values() {
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(0.25),   "0.25");
    }
}
