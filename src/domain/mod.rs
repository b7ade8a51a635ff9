// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that describe the concepts of
// the system. Nothing in here knows about Burn, tensors, files
// or child processes.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// That keeps every type here unit-testable without a GPU.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Hyperparameters that name a training run's output directory
pub mod run_params;

// 2D histogram of sampled points (what each figure panel shows)
pub mod histogram;

// Launcher tasks, debug flags and task outcomes
pub mod task;

// Core abstractions (traits) that other layers implement
pub mod traits;
