//! # Progress Tracking Module
//!
//! Unifica progress bar e output JSON in un singolo tracker thread-safe,
//! condiviso tra i worker del run.

use crate::{
    compressor::CompressionResult,
    error::PrecompressError,
    file_manager::FileManager,
    json_output::JsonMessage,
    progress::{CompressionStats, ProgressManager},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tracker condiviso tra i task di un run
#[derive(Clone)]
pub struct ProgressTracker {
    json_output: bool,
    stats: Arc<Mutex<CompressionStats>>,
    progress_manager: ProgressManager,
}

impl ProgressTracker {
    pub fn new(total_files: usize, json_output: bool) -> Self {
        let progress_manager = if json_output {
            ProgressManager::hidden()
        } else {
            ProgressManager::new(total_files as u64)
        };

        Self {
            json_output,
            stats: Arc::new(Mutex::new(CompressionStats::new())),
            progress_manager,
        }
    }

    /// Registra tutti i risultati di un file sorgente
    pub async fn handle_file_completion(
        &self,
        root: &Path,
        source: &Path,
        results: &[CompressionResult],
    ) {
        {
            let mut stats = self.stats.lock().await;
            stats.add_file(results.first().map(|r| r.original_size).unwrap_or(0));
            for result in results {
                stats.add_result(result);
            }
        }

        for result in results {
            let path = relative_to(root, result.path());
            if self.json_output {
                JsonMessage::result(path, result).emit();
            } else {
                self.progress_manager.println(&format!(
                    "  {} [.{}] {:.3} ({:.1}% saved) {}",
                    path.display(),
                    result.extension,
                    result.factor(),
                    FileManager::calculate_reduction(result.original_size, result.compressed_size),
                    result.outcome.label()
                ));
            }
        }

        let message = relative_to(root, source).display().to_string();
        self.progress_manager.update(&message);
    }

    /// Segnala un errore fatale su un file
    pub async fn handle_file_error(&self, source: &Path, error: &PrecompressError) {
        if self.json_output {
            JsonMessage::error(
                format!("Failed to compress {}", source.display()),
                Some(error.to_string()),
            )
            .emit();
        }
        self.progress_manager
            .set_message(&format!("[ERROR] {}", source.display()));
    }

    /// Finalizza progress bar
    pub fn finish(&self, summary: &str) {
        self.progress_manager.finish(summary);
    }

    /// Ottieni statistiche per report finale
    pub async fn get_stats(&self) -> CompressionStats {
        self.stats.lock().await.clone()
    }
}

/// Path relative to its root, or the full path for single-file roots
pub fn relative_to(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::Outcome;

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(Path::new("/srv/static"), Path::new("/srv/static/css/a.css.gz")),
            PathBuf::from("css/a.css.gz")
        );
        assert_eq!(
            relative_to(Path::new("/srv/humans.txt"), Path::new("/srv/humans.txt")),
            PathBuf::from("/srv/humans.txt")
        );
    }

    #[tokio::test]
    async fn test_tracker_aggregates_stats() {
        let tracker = ProgressTracker::new(1, true);
        let kept = CompressionResult {
            source: PathBuf::from("/s/a.css"),
            artifact: PathBuf::from("/s/a.css.zst"),
            extension: "zst",
            original_size: 100,
            compressed_size: 40,
            outcome: Outcome::Kept,
            written: true,
        };

        tracker
            .handle_file_completion(Path::new("/s"), Path::new("/s/a.css"), &[kept])
            .await;

        let stats = tracker.get_stats().await;
        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.artifacts_kept, 1);
        assert_eq!(stats.total_bytes_saved, 60);
    }
}
