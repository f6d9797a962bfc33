//! # File Compressor Module
//!
//! Wraps one `Codec` with file-level semantics.
//!
//! For a source path the compressor reads the bytes, runs the codec and
//! decides whether the sibling artifact `<source>.<ext>` stays on disk:
//! - smaller than the source: the artifact is written (skipped when the
//!   existing file already holds the same bytes) and the result is `Kept`
//! - same size or larger: no artifact remains after the call, any stale
//!   one from an earlier run is deleted, and the result is `DiscardedNoBenefit`
//!
//! Read and write failures are fatal and carry the offending path.

use crate::codec::Codec;
use crate::error::Result;
use crate::file_manager::FileManager;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Terminal state of one (source file, codec) attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Kept,
    DiscardedNoBenefit,
    DiscardedLostTieBreak,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Kept => "kept",
            Outcome::DiscardedNoBenefit => "no benefit",
            Outcome::DiscardedLostTieBreak => "lost tie-break",
        }
    }
}

/// Result of compressing one source file with one codec
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionResult {
    pub source: PathBuf,
    pub artifact: PathBuf,
    pub extension: &'static str,
    pub original_size: u64,
    pub compressed_size: u64,
    pub outcome: Outcome,
    /// Whether this attempt modified the disk (artifact written or deleted)
    pub written: bool,
}

impl CompressionResult {
    /// compressed size / original size; 1.0 for empty sources
    pub fn factor(&self) -> f64 {
        if self.original_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.original_size as f64
        }
    }

    pub fn kept(&self) -> bool {
        self.outcome == Outcome::Kept
    }

    /// The artifact path when kept, the source path otherwise
    pub fn path(&self) -> &Path {
        if self.kept() {
            &self.artifact
        } else {
            &self.source
        }
    }

    /// Bytes saved by the artifact, zero unless kept
    pub fn bytes_saved(&self) -> u64 {
        if self.kept() {
            self.original_size.saturating_sub(self.compressed_size)
        } else {
            0
        }
    }
}

/// Compressed bytes that are not on disk yet.
///
/// The walker holds these until the selection policy has run, so an artifact
/// that is going to lose a tie-break is never written in the first place.
#[derive(Debug)]
pub struct PendingArtifact {
    pub result: CompressionResult,
    bytes: Vec<u8>,
}

impl PendingArtifact {
    /// Write the artifact unless identical bytes are already there
    pub fn commit(self) -> Result<CompressionResult> {
        let mut result = self.result;
        result.written =
            FileManager::write_if_changed(&result.artifact, &self.bytes, Some(&result.source))?;
        result.outcome = Outcome::Kept;
        Ok(result)
    }

    /// Make sure no artifact remains, deleting a stale one from an earlier run
    pub fn discard(self, outcome: Outcome) -> Result<CompressionResult> {
        let mut result = self.result;
        result.written = FileManager::remove_if_exists(&result.artifact)?;
        if result.written {
            debug!("Removed stale artifact {}", result.artifact.display());
        }
        result.outcome = outcome;
        Ok(result)
    }
}

/// One codec applied to files
#[derive(Debug, Clone)]
pub struct FileCompressor {
    codec: Arc<dyn Codec>,
}

impl FileCompressor {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self { codec }
    }

    pub fn extension(&self) -> &'static str {
        self.codec.extension()
    }

    /// Compress the file at `source` and settle its artifact on disk
    pub fn compress(&self, source: &Path) -> Result<CompressionResult> {
        let data = FileManager::read(source)?;
        self.compress_bytes(source, &data)
    }

    /// Same as [`FileCompressor::compress`] with already-read source bytes
    pub fn compress_bytes(&self, source: &Path, data: &[u8]) -> Result<CompressionResult> {
        let pending = self.attempt(source, data)?;
        if pending.result.kept() {
            pending.commit()
        } else {
            pending.discard(Outcome::DiscardedNoBenefit)
        }
    }

    /// Compress in memory only. The outcome is `Kept` when the output is
    /// smaller than the source, `DiscardedNoBenefit` otherwise.
    pub fn attempt(&self, source: &Path, data: &[u8]) -> Result<PendingArtifact> {
        let compressed = self.codec.compress(data)?;

        let outcome = if compressed.len() >= data.len() {
            Outcome::DiscardedNoBenefit
        } else {
            Outcome::Kept
        };

        debug!(
            "{} -> .{}: {} -> {} bytes ({})",
            source.display(),
            self.extension(),
            data.len(),
            compressed.len(),
            outcome.label()
        );

        Ok(PendingArtifact {
            result: CompressionResult {
                source: source.to_path_buf(),
                artifact: FileManager::sibling_path(source, self.extension()),
                extension: self.extension(),
                original_size: data.len() as u64,
                compressed_size: compressed.len() as u64,
                outcome,
                written: false,
            },
            bytes: compressed,
        })
    }
}
