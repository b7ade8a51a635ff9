// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training loop needs two point clouds per step:
//   - x_0 from a noise distribution
//   - x_1 from the data distribution
//
// Both are "something that produces N points in the plane".
// Programming the trainer against this trait means the
// checkerboard can be swapped for any other synthetic target
// without touching the loop.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use rand::RngCore;

/// A 2D point in the plane.
pub type Point = [f32; 2];

// ─── PointSampler ─────────────────────────────────────────────────────────────
/// Any distribution over the plane that can be sampled on the host.
///
/// Implementations:
///   - Checkerboard     → the synthetic training target
///   - StandardGaussian → the noise source for x_0 and x_init
pub trait PointSampler {
    /// Draw `n` independent points using the supplied RNG.
    fn sample(&self, n: usize, rng: &mut dyn RngCore) -> Vec<Point>;
}
