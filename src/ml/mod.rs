// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Every tensor operation in the project lives here.
//
//   model.rs    — VelocityMlp: five linear layers with Swish,
//                 conditioned on time by concatenation
//
//   solver.rs   — fixed-step Euler / midpoint / RK4 integration
//                 of a velocity field over a time grid
//
//   trainer.rs  — the flow-matching loop (Adam, MSE against the
//                 conditional-OT path velocity)
//
//   sampler.rs  — samples trajectories from a trained model and
//                 renders the per-time-step histograms
//
//   smoke.rs    — a random matmul that proves a backend works
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Lipman et al. (2023) Flow Matching for Generative Modeling

/// Time-conditioned MLP velocity field
pub mod model;

/// Fixed-step ODE integration over a time grid
pub mod solver;

/// Flow-matching training loop
pub mod trainer;

/// Trajectory sampling and figure rendering
pub mod sampler;

/// Random matmul used by the GPU smoke test
pub mod smoke;
