//! Download workers
//!
//! Every accepted job gets its own tokio task. The task probes the media,
//! streams engine progress into the registry and records the terminal state.

pub mod runner;

pub use runner::WorkerRunner;
