// ============================================================
// Layer 5 — Fixed-Step ODE Sampling
// ============================================================
// Generates samples by integrating dx/dt = v(x, t) from noise
// at t = 0 to data at t = 1.
//
// Two ways of stepping:
//
//   step_size = Some(h)
//     Integrate on the grid t0, t0+h, t0+2h, ... (last point
//     clamped to t_end). States at the requested times are
//     linearly interpolated between the two grid states that
//     bracket them, so the requested grid does not need to line
//     up with h.
//
//   step_size = None
//     Take one step between each pair of requested times.
//
// Per step, with t the left end and h the step length:
//
//   Euler     x + h v(x, t)
//   Midpoint  x + h v(x + h/2 v(x, t), t + h/2)
//   RK4       classic four-stage Runge–Kutta
//
// Reference: Butcher (2016) Numerical Methods for ODEs

use anyhow::{bail, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ml::model::VelocityMlp;

// ─── VelocityField ────────────────────────────────────────────────────────────
/// Anything that can be integrated: v(x, t) for a batch of states.
pub trait VelocityField<B: Backend> {
    fn velocity(&self, x: Tensor<B, 2>, t: f32) -> Tensor<B, 2>;
}

impl<B: Backend> VelocityField<B> for VelocityMlp<B> {
    fn velocity(&self, x: Tensor<B, 2>, t: f32) -> Tensor<B, 2> {
        self.forward_at(x, t)
    }
}

// ─── OdeMethod ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OdeMethod {
    Euler,
    #[default]
    Midpoint,
    Rk4,
}

impl OdeMethod {
    /// Advance `x` by one step of length `h` starting at time `t`.
    pub fn step<B: Backend, F: VelocityField<B>>(
        self,
        field: &F,
        x: Tensor<B, 2>,
        t: f32,
        h: f32,
    ) -> Tensor<B, 2> {
        match self {
            OdeMethod::Euler => {
                let k1 = field.velocity(x.clone(), t);
                x + k1 * h
            }
            OdeMethod::Midpoint => {
                let k1  = field.velocity(x.clone(), t);
                let mid = x.clone() + k1 * (h / 2.0);
                let k2  = field.velocity(mid, t + h / 2.0);
                x + k2 * h
            }
            OdeMethod::Rk4 => {
                let k1 = field.velocity(x.clone(), t);
                let k2 = field.velocity(x.clone() + k1.clone() * (h / 2.0), t + h / 2.0);
                let k3 = field.velocity(x.clone() + k2.clone() * (h / 2.0), t + h / 2.0);
                let k4 = field.velocity(x.clone() + k3.clone() * h, t + h);
                x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
            }
        }
    }
}

/// `n` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f32, end: f32, n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f32;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f32 })
                .collect()
        }
    }
}

// ─── OdeSolver ────────────────────────────────────────────────────────────────
/// Smallest accepted fixed step. Finer steps stop being representable
/// as distinct f32 grid times near t = 1.
pub const MIN_STEP_SIZE: f64 = 1e-4;

/// Upper bound on fixed steps for one integration.
pub const MAX_GRID_STEPS: usize = 1_000_000;

/// Shared check for user-supplied step sizes.
pub fn validate_step_size(h: f64) -> Result<()> {
    if !h.is_finite() || h < MIN_STEP_SIZE {
        bail!("ODE step size must be at least {MIN_STEP_SIZE}, got {h}");
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct OdeSolver {
    pub method:    OdeMethod,
    pub step_size: Option<f32>,
}

impl OdeSolver {
    pub fn new(method: OdeMethod, step_size: Option<f32>) -> Self {
        Self { method, step_size }
    }

    /// Integrate from `time_grid[0]` to its last entry.
    ///
    /// Returns `[len(time_grid), N, D]` when `return_intermediates`
    /// is set, `[1, N, D]` (the final state only) otherwise.
    pub fn sample<B: Backend, F: VelocityField<B>>(
        &self,
        field: &F,
        x_init: Tensor<B, 2>,
        time_grid: &[f32],
        return_intermediates: bool,
    ) -> Result<Tensor<B, 3>> {
        validate_time_grid(time_grid)?;
        if let Some(h) = self.step_size {
            validate_step_size(h as f64)?;
            let span = time_grid[time_grid.len() - 1] - time_grid[0];
            let n = (span as f64 / h as f64).ceil();
            if n > MAX_GRID_STEPS as f64 {
                bail!("Step size {h} over [{}, {}] needs {n} steps (max {MAX_GRID_STEPS})",
                    time_grid[0], time_grid[time_grid.len() - 1]);
            }
        }

        let steps = self.integration_grid(time_grid);
        tracing::debug!(
            "Integrating {:?} over {} steps, {} output times",
            self.method, steps.len() - 1, time_grid.len()
        );

        let mut outputs: Vec<Tensor<B, 2>> = Vec::with_capacity(time_grid.len());
        outputs.push(x_init.clone());
        let mut next = 1;

        let mut y0 = x_init;
        for w in steps.windows(2) {
            let (t0, t1) = (w[0], w[1]);
            let y1 = self.method.step(field, y0.clone(), t0, t1 - t0);

            while next < time_grid.len() && t1 >= time_grid[next] {
                outputs.push(linear_interp(t0, t1, &y0, &y1, time_grid[next]));
                next += 1;
            }
            y0 = y1;
        }

        // Float drift on the grid can leave the final time unvisited.
        while outputs.len() < time_grid.len() {
            outputs.push(y0.clone());
        }

        if return_intermediates {
            Ok(Tensor::stack(outputs, 0))
        } else {
            let last = outputs.pop().unwrap_or(y0);
            Ok(last.unsqueeze::<3>())
        }
    }

    /// Times at which the integrator actually evaluates a step.
    fn integration_grid(&self, time_grid: &[f32]) -> Vec<f32> {
        let t0 = time_grid[0];
        let t_end = time_grid[time_grid.len() - 1];

        match self.step_size {
            None => time_grid.to_vec(),
            Some(h) => {
                let n = ((t_end - t0) / h).ceil() as usize;
                let mut grid: Vec<f32> = (0..=n).map(|k| t0 + k as f32 * h).collect();
                if let Some(last) = grid.last_mut() {
                    *last = t_end;
                }
                grid.dedup_by(|b, a| (*b - *a).abs() < f32::EPSILON);
                if grid.len() < 2 {
                    grid = vec![t0, t_end];
                }
                grid
            }
        }
    }
}

fn validate_time_grid(time_grid: &[f32]) -> Result<()> {
    if time_grid.len() < 2 {
        bail!("Time grid needs at least 2 points, got {}", time_grid.len());
    }
    if time_grid.windows(2).any(|w| !(w[1] > w[0])) {
        bail!("Time grid must be strictly increasing: {time_grid:?}");
    }
    Ok(())
}

fn linear_interp<B: Backend>(
    t0: f32,
    t1: f32,
    y0: &Tensor<B, 2>,
    y1: &Tensor<B, 2>,
    t:  f32,
) -> Tensor<B, 2> {
    if t == t0 {
        return y0.clone();
    }
    if t == t1 {
        return y1.clone();
    }
    let slope = (t - t0) / (t1 - t0);
    y0.clone() + (y1.clone() - y0.clone()) * slope
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    /// v(x, t) = c, exact solution x(t) = x0 + c t
    struct Constant(f32);

    impl<B: Backend> VelocityField<B> for Constant {
        fn velocity(&self, x: Tensor<B, 2>, _t: f32) -> Tensor<B, 2> {
            x.zeros_like() + self.0
        }
    }

    /// v(x, t) = x, exact solution x(t) = x0 e^t
    struct Growth;

    impl<B: Backend> VelocityField<B> for Growth {
        fn velocity(&self, x: Tensor<B, 2>, _t: f32) -> Tensor<B, 2> {
            x
        }
    }

    fn values(t: Tensor<TestBackend, 3>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(0.0, 1.0, 1), vec![0.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_constant_field_with_interpolation() {
        let device = Default::default();
        let x0 = Tensor::<TestBackend, 2>::zeros([3, 2], &device);
        // h = 0.3 does not divide the output grid, interpolation kicks in
        let solver = OdeSolver::new(OdeMethod::Midpoint, Some(0.3));
        let sol = solver.sample(&Constant(2.0), x0, &[0.0, 0.5, 1.0], true).unwrap();
        assert_eq!(sol.dims(), [3, 3, 2]);

        let v = values(sol);
        for (i, expect) in [0.0, 1.0, 2.0].iter().enumerate() {
            for got in &v[i * 6..(i + 1) * 6] {
                assert!((got - expect).abs() < 1e-5, "t index {i}: {got} vs {expect}");
            }
        }
    }

    #[test]
    fn test_final_only() {
        let device = Default::default();
        let x0 = Tensor::<TestBackend, 2>::ones([2, 2], &device);
        let solver = OdeSolver::new(OdeMethod::Euler, None);
        let sol = solver.sample(&Constant(-1.0), x0, &linspace(0.0, 1.0, 4), false).unwrap();
        assert_eq!(sol.dims(), [1, 2, 2]);
        assert!(values(sol).iter().all(|v| v.abs() < 1e-5));
    }

    #[test]
    fn test_method_accuracy_ordering() {
        let device = Default::default();
        let exact  = std::f32::consts::E;
        let err = |method: OdeMethod| {
            let x0  = Tensor::<TestBackend, 2>::ones([1, 2], &device);
            let sol = OdeSolver::new(method, Some(0.1))
                .sample(&Growth, x0, &[0.0, 1.0], false)
                .unwrap();
            (values(sol)[0] - exact).abs()
        };

        let (euler, midpoint, rk4) = (err(OdeMethod::Euler), err(OdeMethod::Midpoint), err(OdeMethod::Rk4));
        assert!(midpoint < euler);
        assert!(rk4 < midpoint);
        assert!(rk4 < 1e-4);
    }

    #[test]
    fn test_rejects_bad_grids() {
        let device = Default::default();
        let x0 = Tensor::<TestBackend, 2>::zeros([1, 2], &device);
        let solver = OdeSolver::new(OdeMethod::Midpoint, Some(0.1));
        assert!(solver.sample(&Growth, x0.clone(), &[0.0], true).is_err());
        assert!(solver.sample(&Growth, x0.clone(), &[0.0, 0.5, 0.5], true).is_err());
        let bad_step = OdeSolver::new(OdeMethod::Midpoint, Some(0.0));
        assert!(bad_step.sample(&Growth, x0, &[0.0, 1.0], true).is_err());
    }

    #[test]
    fn test_rejects_tiny_or_huge_step_counts() {
        let device = Default::default();
        let x0 = Tensor::<TestBackend, 2>::zeros([1, 2], &device);

        let tiny = OdeSolver::new(OdeMethod::Euler, Some(1e-9));
        assert!(tiny.sample(&Growth, x0.clone(), &[0.0, 1.0], false).is_err());

        // Legal step, but far too many of them over a long span
        let long = OdeSolver::new(OdeMethod::Euler, Some(1e-3));
        assert!(long.sample(&Growth, x0, &[0.0, 1.0e4], false).is_err());

        assert!(validate_step_size(MIN_STEP_SIZE).is_ok());
        assert!(validate_step_size(MIN_STEP_SIZE / 2.0).is_err());
        assert!(validate_step_size(f64::INFINITY).is_err());
    }
}
