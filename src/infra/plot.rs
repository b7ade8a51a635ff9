// ============================================================
// Layer 6 — Figure Rendering
// ============================================================
// Renders histogram panels side by side into one PNG:
//
//   ┌──────┐  ┌──────┐  ┌──────┐
//   │ t=0  │  │ t=.5 │  │ t=1  │    white gutters between panels
//   └──────┘  └──────┘  └──────┘
//
// Each bin becomes a PIXELS_PER_BIN square. Bin rows are
// flipped so that larger y is higher up in the image, and
// every bin is coloured with a viridis ramp after clipping to
// the panel's [vmin, vmax] colour range. Axes are off; panel
// titles go to the JSON manifest instead.
//
// Reference: image crate documentation (RgbImage, save)

use anyhow::{bail, Context, Result};
use image::{Rgb, RgbImage};
use std::path::Path;

use crate::domain::histogram::Histogram2d;

pub const PIXELS_PER_BIN: u32 = 2;
pub const GUTTER: u32 = 8;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Viridis sampled at nine evenly spaced points.
const VIRIDIS: [[u8; 3]; 9] = [
    [68, 1, 84],
    [71, 44, 122],
    [59, 82, 139],
    [44, 113, 142],
    [33, 145, 140],
    [39, 173, 129],
    [92, 200, 99],
    [170, 220, 50],
    [253, 231, 37],
];

/// One panel of the figure.
#[derive(Debug, Clone)]
pub struct Panel {
    pub hist: Histogram2d,
    pub vmin: f64,
    pub vmax: f64,
}

/// Map v in [0, 1] onto the viridis ramp.
pub fn viridis(v: f32) -> Rgb<u8> {
    let v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    let pos  = v * (VIRIDIS.len() - 1) as f32;
    let lo   = pos.floor() as usize;
    let hi   = (lo + 1).min(VIRIDIS.len() - 1);
    let frac = pos - lo as f32;

    let mut out = [0u8; 3];
    for (c, slot) in out.iter_mut().enumerate() {
        let a = VIRIDIS[lo][c] as f32;
        let b = VIRIDIS[hi][c] as f32;
        *slot = (a + (b - a) * frac).round() as u8;
    }
    Rgb(out)
}

/// Lay out all panels in one row.
pub fn render_panels(panels: &[Panel]) -> Result<RgbImage> {
    let Some(first) = panels.first() else {
        bail!("Nothing to render: no panels");
    };
    let bins = first.hist.bins;
    if panels.iter().any(|p| p.hist.bins != bins) {
        bail!("All panels must use the same number of bins");
    }

    let side   = bins as u32 * PIXELS_PER_BIN;
    let count  = panels.len() as u32;
    let width  = count * side + (count + 1) * GUTTER;
    let height = side + 2 * GUTTER;
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

    for (k, panel) in panels.iter().enumerate() {
        let x0     = GUTTER + k as u32 * (side + GUTTER);
        let values = panel.hist.normalized(panel.vmin, panel.vmax);

        for row in 0..bins {
            // row 0 is the lowest y → bottom of the panel
            let py0 = GUTTER + (bins - 1 - row) as u32 * PIXELS_PER_BIN;
            for col in 0..bins {
                let colour = viridis(values[row * bins + col]);
                let px0 = x0 + col as u32 * PIXELS_PER_BIN;
                for dy in 0..PIXELS_PER_BIN {
                    for dx in 0..PIXELS_PER_BIN {
                        img.put_pixel(px0 + dx, py0 + dy, colour);
                    }
                }
            }
        }
    }

    Ok(img)
}

/// Render and write a PNG.
pub fn save_panels(panels: &[Panel], path: &Path) -> Result<()> {
    let img = render_panels(panels)?;
    img.save(path)
        .with_context(|| format!("Cannot save figure to '{}'", path.display()))?;
    tracing::debug!("Wrote {}x{} figure to '{}'", img.width(), img.height(), path.display());
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viridis_endpoints() {
        assert_eq!(viridis(0.0), Rgb([68, 1, 84]));
        assert_eq!(viridis(1.0), Rgb([253, 231, 37]));
        assert_eq!(viridis(f32::NAN), Rgb([68, 1, 84]));
        assert_eq!(viridis(0.5), Rgb([33, 145, 140]));
    }

    #[test]
    fn test_layout_and_orientation() {
        // 2×2 bins, one count in the top-right cell (row 1, col 1)
        let hist = Histogram2d { bins: 2, range: (0.0, 1.0), counts: vec![0, 0, 0, 4] };
        let panels = vec![
            Panel { hist: hist.clone(), vmin: 0.0, vmax: 4.0 },
            Panel { hist,               vmin: 0.0, vmax: 4.0 },
        ];
        let img  = render_panels(&panels).unwrap();
        let side = 2 * PIXELS_PER_BIN;
        assert_eq!(img.width(),  2 * side + 3 * GUTTER);
        assert_eq!(img.height(), side + 2 * GUTTER);

        // gutter stays white
        assert_eq!(*img.get_pixel(0, 0), BACKGROUND);
        // top-right bin of the first panel is the hottest colour
        let hot = img.get_pixel(GUTTER + side - 1, GUTTER);
        assert_eq!(*hot, viridis(1.0));
        // bottom-left bin is the coldest
        let cold = img.get_pixel(GUTTER, GUTTER + side - 1);
        assert_eq!(*cold, viridis(0.0));
    }

    #[test]
    fn test_empty_or_mismatched_panels_fail() {
        assert!(render_panels(&[]).is_err());
        let a = Panel { hist: Histogram2d::from_points(&[], 2, (0.0, 1.0)), vmin: 0.0, vmax: 1.0 };
        let b = Panel { hist: Histogram2d::from_points(&[], 3, (0.0, 1.0)), vmin: 0.0, vmax: 1.0 };
        assert!(render_panels(&[a, b]).is_err());
    }

    #[test]
    fn test_save_png() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("fig.png");
        let hist = Histogram2d::from_points(&[[0.5, 0.5]], 4, (0.0, 1.0));
        save_panels(&[Panel { hist, vmin: 0.0, vmax: 1.0 }], &path).unwrap();
        assert!(path.exists());
    }
}
