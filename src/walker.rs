//! # Directory Walker / Selector Module
//!
//! Questo modulo visita un albero di directory e applica tutti i compressori
//! ad ogni file eleggibile, decidendo quali artifact tenere.
//!
//! ## Responsabilità:
//! - Enumerazione lazy dei file sorgente (`SourceFiles`)
//! - Esclusione delle estensioni ignorate (suffissi dei codec + lista fissa)
//! - Esecuzione dei compressori nell'ordine configurato (`process_file`)
//! - Policy di selezione per file binari (`select`)
//! - Stream lazy dei risultati, un file alla volta (`compress_dir`)
//!
//! ## Policy di selezione:
//! - Estensione nel set BINARY con più di un candidato tenuto: vince il
//!   candidato con la coppia `(factor, extension)` minima; gli altri artifact
//!   vengono eliminati e riportati come `DiscardedLostTieBreak` con il path
//!   sorgente
//! - Altrimenti tutti i candidati con beneficio restano su disco
//!
//! ## Esempio:
//! ```ignore
//! let policy = SelectionPolicy::from_config(&config, &codecs);
//! let compressors = compressors_for(&codecs);
//! for result in compress_dir(Path::new("static"), &compressors, &policy) {
//!     let result = result?;
//!     println!("{} {:.2} {}", result.path().display(), result.factor(), result.kept());
//! }
//! ```

use crate::codec::CodecSet;
use crate::compressor::{CompressionResult, FileCompressor, Outcome, PendingArtifact};
use crate::config::Config;
use crate::error::Result;
use crate::file_manager::FileManager;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Extension classes that drive eligibility and selection
#[derive(Debug, Clone, Default)]
pub struct SelectionPolicy {
    binary_extensions: HashSet<String>,
    ignored_extensions: HashSet<String>,
}

impl SelectionPolicy {
    /// `ignored` is the fixed exclusion list; codec extensions are added to it
    pub fn new<B, I, C>(binary: B, ignored: I, codec_extensions: C) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let normalize = |ext: &str| ext.trim_start_matches('.').to_ascii_lowercase();

        let binary_extensions = binary.into_iter().map(|e| normalize(e.as_ref())).collect();
        let ignored_extensions = ignored
            .into_iter()
            .map(|e| normalize(e.as_ref()))
            .chain(codec_extensions.into_iter().map(|e| normalize(e.as_ref())))
            .collect();

        Self {
            binary_extensions,
            ignored_extensions,
        }
    }

    pub fn from_config(config: &Config, codecs: &CodecSet) -> Self {
        Self::new(
            &config.binary_extensions,
            &config.ignored_extensions,
            codecs.reserved_extensions(),
        )
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        FileManager::has_extension_in(path, &self.ignored_extensions)
    }

    pub fn is_binary(&self, path: &Path) -> bool {
        FileManager::has_extension_in(path, &self.binary_extensions)
    }
}

/// One `FileCompressor` per available codec, in configured order
pub fn compressors_for(codecs: &CodecSet) -> Vec<FileCompressor> {
    codecs
        .available()
        .iter()
        .cloned()
        .map(FileCompressor::new)
        .collect()
}

/// Lazy enumeration of eligible source files under a root
pub struct SourceFiles {
    entries: walkdir::IntoIter,
    policy: SelectionPolicy,
}

impl SourceFiles {
    pub fn new(root: &Path, policy: &SelectionPolicy) -> Self {
        Self {
            entries: WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter(),
            policy: policy.clone(),
        }
    }
}

impl Iterator for SourceFiles {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };

            // Links below the root are not followed
            if entry.depth() > 0 && entry.path_is_symlink() {
                debug!("Skipping symlink: {}", entry.path().display());
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            if self.policy.is_ignored(entry.path()) {
                debug!("Skipping ignored file: {}", entry.path().display());
                continue;
            }
            return Some(Ok(entry.into_path()));
        }
    }
}

/// Run every compressor on one file and apply the selection policy.
///
/// No-benefit discards come first, in compressor order, followed by the
/// selected candidates. Nothing is written before selection, so a losing
/// binary variant never reaches the disk.
pub fn process_file(
    source: &Path,
    compressors: &[FileCompressor],
    policy: &SelectionPolicy,
) -> Result<Vec<CompressionResult>> {
    let data = FileManager::read(source)?;
    let mut results = Vec::with_capacity(compressors.len());
    let mut candidates = Vec::new();

    for compressor in compressors {
        let pending = compressor.attempt(source, &data)?;
        if pending.result.kept() {
            candidates.push(pending);
        } else {
            results.push(pending.discard(Outcome::DiscardedNoBenefit)?);
        }
    }

    results.extend(select(candidates, policy.is_binary(source))?);
    Ok(results)
}

/// Keep every candidate, or only the best one for binary files.
///
/// The winner is the smallest `(factor, extension)` pair. Losers are reported
/// against the source path and any artifact they left on disk is deleted.
pub fn select(
    mut candidates: Vec<PendingArtifact>,
    binary: bool,
) -> Result<Vec<CompressionResult>> {
    if !binary || candidates.len() <= 1 {
        return candidates.into_iter().map(PendingArtifact::commit).collect();
    }

    let winner = candidates
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.result
                .factor()
                .total_cmp(&b.result.factor())
                .then_with(|| a.result.extension.cmp(b.result.extension))
        })
        .map(|(index, _)| index)
        .unwrap_or(0);

    let mut selected = Vec::with_capacity(candidates.len());
    selected.push(candidates.remove(winner).commit()?);

    for loser in candidates {
        debug!(
            "{}: .{} lost to .{}",
            loser.result.source.display(),
            loser.result.extension,
            selected[0].extension
        );
        selected.push(loser.discard(Outcome::DiscardedLostTieBreak)?);
    }

    Ok(selected)
}

/// Compress every eligible file under `root`, one file at a time.
///
/// The stream stops after the first error.
pub fn compress_dir<'a>(
    root: &Path,
    compressors: &'a [FileCompressor],
    policy: &'a SelectionPolicy,
) -> CompressDir<'a> {
    CompressDir {
        files: SourceFiles::new(root, policy),
        compressors,
        policy,
        pending: VecDeque::new(),
        done: false,
    }
}

/// Lazy result stream returned by [`compress_dir`]
pub struct CompressDir<'a> {
    files: SourceFiles,
    compressors: &'a [FileCompressor],
    policy: &'a SelectionPolicy,
    pending: VecDeque<CompressionResult>,
    done: bool,
}

impl Iterator for CompressDir<'_> {
    type Item = Result<CompressionResult>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(result) = self.pending.pop_front() {
                return Some(Ok(result));
            }
            if self.done {
                return None;
            }

            let processed = match self.files.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Ok(source)) => process_file(&source, self.compressors, self.policy),
                Some(Err(e)) => Err(e),
            };

            match processed {
                Ok(results) => self.pending.extend(results),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl std::iter::FusedIterator for CompressDir<'_> {}
