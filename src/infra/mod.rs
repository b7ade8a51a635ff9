// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that talk to the outside world:
//
//   checkpoint.rs — model weights (Burn CompactRecorder) and
//                   the run's TrainConfig as JSON
//
//   metrics.rs    — training curve rows in metrics.csv
//
//   plot.rs       — histogram panels → PNG figure
//
//   launcher.rs   — runs a file of shell commands, one per GPU
//                   slot, with the launcher environment set
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Figure rendering with the image crate
pub mod plot;

/// Node-local GPU task launcher
pub mod launcher;

/// nvidia-smi based GPU discovery for the smoke test
pub mod gpu;
