// ============================================================
// Layer 3 — 2D Histogram
// ============================================================
// Each panel of the trajectory figure is a 2D histogram of the
// sampled points at one time step.
//
//   bins × bins square cells over [lo, hi] × [lo, hi]
//   counts[row * bins + col]   (row = y bin, col = x bin)
//
// Points outside the range are dropped, exactly like a
// histogram with an explicit range would do. The colour scale
// is clipped at the 0.99 quantile of the bin counts so a few
// dense cells do not wash out the rest of the panel.
//
// Reference: Rust Book §8 (Vectors)

use serde::{Deserialize, Serialize};

use crate::domain::traits::Point;

/// Number of bins per axis used for the figure panels.
pub const DEFAULT_BINS: usize = 300;

/// Axis range used for the figure panels.
pub const DEFAULT_RANGE: (f32, f32) = (-5.0, 5.0);

/// Upper colour limit quantile.
pub const COLOR_QUANTILE: f64 = 0.99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram2d {
    pub bins:   usize,
    pub range:  (f32, f32),
    /// Row-major counts, row = y bin (0 = lowest y), col = x bin.
    pub counts: Vec<u32>,
}

impl Histogram2d {
    /// Bin `points` into a `bins × bins` grid over `range²`.
    pub fn from_points(points: &[Point], bins: usize, range: (f32, f32)) -> Self {
        let mut counts = vec![0u32; bins * bins];
        let (lo, hi) = range;
        let width = hi - lo;

        if bins > 0 && width > 0.0 {
            for &[x, y] in points {
                if let (Some(col), Some(row)) = (
                    bin_index(x, lo, hi, width, bins),
                    bin_index(y, lo, hi, width, bins),
                ) {
                    counts[row * bins + col] += 1;
                }
            }
        }

        Self { bins, range, counts }
    }

    /// Total number of points that landed inside the range.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Quantile of the bin counts with linear interpolation
    /// between order statistics (pos = q * (n - 1)).
    pub fn quantile(&self, q: f64) -> f64 {
        if self.counts.is_empty() {
            return 0.0;
        }
        let mut sorted = self.counts.clone();
        sorted.sort_unstable();

        let q   = q.clamp(0.0, 1.0);
        let pos = q * (sorted.len() - 1) as f64;
        let lo  = pos.floor() as usize;
        let hi  = pos.ceil() as usize;
        let frac = pos - lo as f64;

        sorted[lo] as f64 + (sorted[hi] as f64 - sorted[lo] as f64) * frac
    }

    /// Map every bin count into [0, 1] using a linear colour scale
    /// clipped to [vmin, vmax]. A degenerate scale maps to 0.
    pub fn normalized(&self, vmin: f64, vmax: f64) -> Vec<f32> {
        let span = vmax - vmin;
        self.counts
            .iter()
            .map(|&c| {
                if span <= 0.0 {
                    0.0
                } else {
                    ((c as f64 - vmin) / span).clamp(0.0, 1.0) as f32
                }
            })
            .collect()
    }
}

/// Bin index of `v` in [lo, hi]; `hi` itself lands in the last bin.
fn bin_index(v: f32, lo: f32, hi: f32, width: f32, bins: usize) -> Option<usize> {
    if !v.is_finite() || v < lo || v > hi {
        return None;
    }
    let idx = (((v - lo) / width) * bins as f32) as usize;
    Some(idx.min(bins - 1))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn count(h: &Histogram2d, row: usize, col: usize) -> u32 {
        h.counts[row * h.bins + col]
    }

    #[test]
    fn test_points_land_in_expected_bins() {
        let pts  = vec![[-5.0, -5.0], [4.99, -5.0], [0.0, 0.0]];
        let hist = Histogram2d::from_points(&pts, 10, (-5.0, 5.0));
        assert_eq!(count(&hist, 0, 0), 1);
        assert_eq!(count(&hist, 0, 9), 1);
        // 0.0 sits at the start of bin 5
        assert_eq!(count(&hist, 5, 5), 1);
        assert_eq!(hist.total(), 3);
    }

    #[test]
    fn test_upper_edge_goes_to_last_bin() {
        let hist = Histogram2d::from_points(&[[5.0, 5.0]], 4, (-5.0, 5.0));
        assert_eq!(count(&hist, 3, 3), 1);
    }

    #[test]
    fn test_out_of_range_and_nan_are_dropped() {
        let pts  = vec![[6.0, 0.0], [0.0, -5.1], [f32::NAN, 0.0], [1.0, 1.0]];
        let hist = Histogram2d::from_points(&pts, 8, (-5.0, 5.0));
        assert_eq!(hist.total(), 1);
    }

    #[test]
    fn test_quantile_interpolates() {
        let hist = Histogram2d { bins: 2, range: (0.0, 1.0), counts: vec![0, 10, 20, 30] };
        assert_eq!(hist.quantile(0.0), 0.0);
        assert_eq!(hist.quantile(1.0), 30.0);
        // pos = 0.5 * 3 = 1.5 → halfway between 10 and 20
        assert!((hist.quantile(0.5) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalized_clips_to_unit_range() {
        let hist = Histogram2d { bins: 2, range: (0.0, 1.0), counts: vec![0, 5, 10, 40] };
        let n = hist.normalized(0.0, 10.0);
        assert_eq!(n, vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_degenerate_scale_is_all_zero() {
        let hist = Histogram2d::from_points(&[], 3, (-1.0, 1.0));
        assert_eq!(hist.quantile(0.99), 0.0);
        assert!(hist.normalized(0.0, 0.0).iter().all(|&v| v == 0.0));
    }
}
