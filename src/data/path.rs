// ============================================================
// Layer 4 — Affine Probability Path
// ============================================================
// Flow matching regresses a velocity field onto the time
// derivative of a prescribed path between noise x_0 and data x_1:
//
//   x_t  = sigma(t) * x_0 + alpha(t) * x_1
//   dx_t = sigma'(t) * x_0 + alpha'(t) * x_1
//
// The scheduler supplies alpha, sigma and their derivatives.
// The conditional optimal-transport scheduler is the straight
// line between the two endpoints:
//
//   alpha(t) = t,   sigma(t) = 1 - t
//   dx_t     = x_1 - x_0           (constant along the path)
//
// Everything here is host-side; data::batch moves the result
// onto a device.

use anyhow::{bail, Result};

use crate::domain::traits::Point;

// ─── Scheduler ────────────────────────────────────────────────────────────────
pub trait Scheduler {
    fn alpha(&self, t: f32) -> f32;
    fn sigma(&self, t: f32) -> f32;
    fn d_alpha(&self, t: f32) -> f32;
    fn d_sigma(&self, t: f32) -> f32;
}

/// Conditional optimal-transport scheduler: straight-line paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct CondOtScheduler;

impl Scheduler for CondOtScheduler {
    fn alpha(&self, t: f32) -> f32 { t }
    fn sigma(&self, t: f32) -> f32 { 1.0 - t }
    fn d_alpha(&self, _t: f32) -> f32 { 1.0 }
    fn d_sigma(&self, _t: f32) -> f32 { -1.0 }
}

// ─── PathSample ───────────────────────────────────────────────────────────────
/// One batch of points on the path together with their targets.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSample {
    pub x_t:  Vec<Point>,
    pub dx_t: Vec<Point>,
    pub t:    Vec<f32>,
}

// ─── AffinePath ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default)]
pub struct AffinePath<S: Scheduler> {
    pub scheduler: S,
}

impl<S: Scheduler> AffinePath<S> {
    pub fn new(scheduler: S) -> Self {
        Self { scheduler }
    }

    /// Evaluate the path at per-sample times `t`.
    pub fn sample(&self, t: &[f32], x_0: &[Point], x_1: &[Point]) -> Result<PathSample> {
        if t.len() != x_0.len() || x_0.len() != x_1.len() {
            bail!(
                "Path sample size mismatch: t={}, x_0={}, x_1={}",
                t.len(), x_0.len(), x_1.len()
            );
        }

        let s = &self.scheduler;
        let mut x_t  = Vec::with_capacity(t.len());
        let mut dx_t = Vec::with_capacity(t.len());

        for ((&ti, a), b) in t.iter().zip(x_0).zip(x_1) {
            let (alpha, sigma)     = (s.alpha(ti), s.sigma(ti));
            let (d_alpha, d_sigma) = (s.d_alpha(ti), s.d_sigma(ti));
            x_t.push([
                sigma * a[0] + alpha * b[0],
                sigma * a[1] + alpha * b[1],
            ]);
            dx_t.push([
                d_sigma * a[0] + d_alpha * b[0],
                d_sigma * a[1] + d_alpha * b[1],
            ]);
        }

        Ok(PathSample { x_t, dx_t, t: t.to_vec() })
    }
}
