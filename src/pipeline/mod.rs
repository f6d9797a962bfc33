//! # Pipeline Module
//!
//! Modulo che separa le responsabilità del driver in sottomoduli:
//! - `precompressor`: Orchestratore principale (run e clean)
//! - `progress_tracker`: Reporting unificato (progress bar o JSON)

pub mod precompressor;
pub mod progress_tracker;

pub use precompressor::{CleanReport, Precompressor, RunReport};
pub use progress_tracker::ProgressTracker;
