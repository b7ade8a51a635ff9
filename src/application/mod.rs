// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case coordinates the other layers to reach one goal.
//
// Rules for this layer:
//   - No tensor code here (that's Layer 5)
//   - No direct file or process access (that's Layer 6)
//   - Only workflow coordination and config validation
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Train a velocity field, checkpoint it, render trajectories
pub mod train_use_case;

// Re-render trajectories from a saved run
pub mod sample_use_case;

// GPU smoke test job
pub mod smoke_use_case;

// Run a command-lines file across the node's GPUs
pub mod launch_use_case;
