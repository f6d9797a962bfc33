//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file della pipeline.
//!
//! ## Responsabilità:
//! - Naming degli artifact: il suffisso del codec viene sempre *aggiunto*
//!   al path sorgente, mai sostituito (`app.js` → `app.js.gz`)
//! - Confronto estensioni case-insensitive
//! - Scrittura atomica degli artifact (file temporaneo + rename)
//! - Skip della scrittura se l'artifact esistente è identico byte per byte
//! - Rimozione idempotente degli artifact
//! - Utilità per formattazione dimensioni e percentuali
//!
//! ## Operazioni sui file:
//! - `sibling_path()`: Calcola il path dell'artifact per un codec
//! - `write_if_changed()`: Scrive solo se il contenuto è cambiato
//! - `remove_if_exists()`: Elimina senza errore se il file non c'è
//! - `find_artifacts()`: Trova tutti gli artifact sotto una root (per `clean`)
//!
//! ## Esempio:
//! ```ignore
//! let output = FileManager::sibling_path(Path::new("static/app.js"), "zst");
//! let written = FileManager::write_if_changed(&output, &compressed, Some(source))?;
//! ```

use crate::error::{PrecompressError, Result};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Manages file operations for sources and artifacts
pub struct FileManager;

impl FileManager {
    /// Lowercased extension of a path, if any
    pub fn extension_of(path: &Path) -> Option<String> {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    /// Check whether the path's extension is in a set of lowercase extensions
    pub fn has_extension_in(path: &Path, extensions: &HashSet<String>) -> bool {
        Self::extension_of(path)
            .map(|ext| extensions.contains(&ext))
            .unwrap_or(false)
    }

    /// Path of the compressed sibling: `<source>.<extension>`
    pub fn sibling_path(source: &Path, extension: &str) -> PathBuf {
        let mut name = OsString::from(source.as_os_str());
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    }

    /// Read a whole file, tagging errors with the path
    pub fn read(path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| PrecompressError::io(path, e))
    }

    /// Write `bytes` to `path` unless it already holds exactly those bytes.
    ///
    /// Returns `true` when the disk was written. The write goes through a
    /// temporary file in the same directory and a rename, so readers never
    /// see a half-written artifact. With `permissions_of` the new file gets
    /// that file's permissions instead of the temp file's private mode.
    pub fn write_if_changed(path: &Path, bytes: &[u8], permissions_of: Option<&Path>) -> Result<bool> {
        match fs::read(path) {
            Ok(existing) if existing == bytes => return Ok(false),
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(PrecompressError::io(path, e)),
        }

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir).map_err(|e| PrecompressError::io(dir, e))?;
        if let Err(e) = temp.write_all(bytes).and_then(|_| temp.flush()) {
            return Err(PrecompressError::io(path, e));
        }
        if let Some(template) = permissions_of {
            let permissions = fs::metadata(template)
                .map_err(|e| PrecompressError::io(template, e))?
                .permissions();
            temp.as_file()
                .set_permissions(permissions)
                .map_err(|e| PrecompressError::io(path, e))?;
        }
        temp.persist(path)
            .map_err(|e| PrecompressError::io(path, e.error))?;

        Ok(true)
    }

    /// Delete a file, returning whether it existed
    pub fn remove_if_exists(path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PrecompressError::io(path, e)),
        }
    }

    /// Find every file under `root` whose extension is in `extensions`
    pub fn find_artifacts(root: &Path, extensions: &HashSet<String>) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && Self::has_extension_in(entry.path(), extensions) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
