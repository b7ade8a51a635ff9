// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from random numbers to device-ready tensors.
//
//   seeded host RNG
//       │
//       ▼
//   Checkerboard / StandardGaussian  → x_1 and x_0 point clouds
//       │
//       ▼
//   AffinePath (CondOT scheduler)    → x_t, dx_t for sampled t
//       │
//       ▼
//   FlowBatch                        → [N,2] / [N] tensors
//
// There is no dataset on disk: the target distribution is
// infinite, so a fresh batch is drawn every iteration.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Checkerboard target and Gaussian noise samplers
pub mod checkerboard;

/// Affine probability path and the conditional-OT scheduler
pub mod path;

/// Host samples → Burn tensors
pub mod batch;
