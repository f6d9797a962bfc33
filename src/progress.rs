//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce la progress bar e le statistiche di compressione.
//!
//! ## Componenti principali:
//! - `ProgressManager`: Gestisce la progress bar principale (`indicatif`)
//! - `CompressionStats`: Traccia statistiche cumulative del run
//!
//! ## Statistiche tracciate:
//! - **files_processed**: File sorgente elaborati
//! - **artifacts_kept**: Artifact rimasti su disco
//! - **discarded_no_benefit**: Output non più piccoli della sorgente
//! - **discarded_lost_tie_break**: Artifact binari scartati a favore di un altro codec
//! - **writes**: Operazioni che hanno modificato il disco (zero su un run ripetuto)
//! - **total_bytes_saved**: Byte risparmiati dagli artifact tenuti
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [=========>------------------------------] 42/180 (23%) css/site.css.zst 0.21
//! ```

use crate::compressor::{CompressionResult, Outcome};
use crate::file_manager::FileManager;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// Manages progress reporting for a precompression run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        ) {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A manager that draws nothing, used in JSON mode
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Set a custom message without incrementing
    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Print a line above the bar
    pub fn println(&self, line: &str) {
        if self.bar.is_hidden() {
            return;
        }
        self.bar.println(line);
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics tracker for compression results
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CompressionStats {
    pub files_processed: usize,
    pub artifacts_kept: usize,
    pub discarded_no_benefit: usize,
    pub discarded_lost_tie_break: usize,
    pub writes: usize,
    pub total_original_size: u64,
    /// Source bytes behind the kept artifacts
    pub kept_original_size: u64,
    pub total_bytes_saved: u64,
}

impl CompressionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, original_size: u64) {
        self.files_processed += 1;
        self.total_original_size += original_size;
    }

    pub fn add_result(&mut self, result: &CompressionResult) {
        match result.outcome {
            Outcome::Kept => self.artifacts_kept += 1,
            Outcome::DiscardedNoBenefit => self.discarded_no_benefit += 1,
            Outcome::DiscardedLostTieBreak => self.discarded_lost_tie_break += 1,
        }
        if result.written {
            self.writes += 1;
        }
        if result.kept() {
            self.kept_original_size += result.original_size;
        }
        self.total_bytes_saved += result.bytes_saved();
    }

    /// Average reduction of the kept artifacts
    pub fn overall_reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(
            self.kept_original_size,
            self.kept_original_size.saturating_sub(self.total_bytes_saved),
        )
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Kept: {} | No benefit: {} | Lost tie-break: {} | Writes: {} | Saved: {} ({:.2}%)",
            self.files_processed,
            self.artifacts_kept,
            self.discarded_no_benefit,
            self.discarded_lost_tie_break,
            self.writes,
            FileManager::format_size(self.total_bytes_saved),
            self.overall_reduction_percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn result(outcome: Outcome, written: bool) -> CompressionResult {
        CompressionResult {
            source: PathBuf::from("app.js"),
            artifact: PathBuf::from("app.js.gz"),
            extension: "gz",
            original_size: 1000,
            compressed_size: 400,
            outcome,
            written,
        }
    }

    #[test]
    fn test_stats_count_each_outcome() {
        let mut stats = CompressionStats::new();
        stats.add_file(1000);
        stats.add_result(&result(Outcome::Kept, true));
        stats.add_result(&result(Outcome::DiscardedNoBenefit, false));
        stats.add_result(&result(Outcome::DiscardedLostTieBreak, true));

        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.artifacts_kept, 1);
        assert_eq!(stats.discarded_no_benefit, 1);
        assert_eq!(stats.discarded_lost_tie_break, 1);
        assert_eq!(stats.writes, 2);
        assert_eq!(stats.total_bytes_saved, 600);
        assert!((stats.overall_reduction_percent() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_stats_summary() {
        let stats = CompressionStats::new();
        assert_eq!(stats.overall_reduction_percent(), 0.0);
        assert!(stats.format_summary().starts_with("Processed: 0 files"));
    }
}
