//! # Codec Module
//!
//! Questo modulo definisce l'astrazione `Codec` e il registro dei codec disponibili.
//!
//! ## Responsabilità:
//! - Definisce il trait `Codec` (estensione, compressione, dipendenze mancanti)
//! - Fornisce `CodecSet`: l'insieme ordinato dei codec configurati per un run
//! - Separa i codec disponibili da quelli senza libreria compilata
//!
//! ## Codec inclusi:
//! - `gz`: DEFLATE esaustivo (zopfli) in container gzip
//! - `zst`: Zstandard livello 22 con checksum del frame
//!
//! Le librerie di compressione sono feature cargo opzionali. Un codec compilato
//! senza la sua feature resta nel set configurato (il suo suffisso viene ancora
//! ignorato e ripulito da `clean`) ma viene escluso dal set attivo e segnalato
//! all'operatore.
//!
//! ## Esempio:
//! ```ignore
//! let codecs = CodecSet::discover(&["gz".to_string(), "zst".to_string()])?;
//! for (codec, dependency) in codecs.missing_dependencies() {
//!     warn!("{} unavailable: {} not compiled in", codec, dependency);
//! }
//! ```

pub mod zopfli_codec;
pub mod zstd_codec;

pub use zopfli_codec::ZopfliCodec;
pub use zstd_codec::ZstdCodec;

use crate::error::{PrecompressError, Result};
use std::fmt;
use std::sync::Arc;

/// A named, stateless compression strategy.
///
/// Implementations must be deterministic: the same input always yields
/// byte-identical output, since re-runs compare new bytes against the
/// artifact already on disk.
pub trait Codec: Send + Sync + fmt::Debug {
    /// Suffix appended to the source path, without the leading dot
    fn extension(&self) -> &'static str;

    /// Human-readable name for reporting
    fn name(&self) -> &'static str;

    /// Compress a whole buffer
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Names of the libraries this codec needs but which are not available
    fn missing_dependencies(&self) -> Vec<&'static str>;

    fn is_available(&self) -> bool {
        self.missing_dependencies().is_empty()
    }
}

/// Ordered codec collection for one pipeline run
#[derive(Clone, Debug)]
pub struct CodecSet {
    configured: Vec<Arc<dyn Codec>>,
    available: Vec<Arc<dyn Codec>>,
}

impl CodecSet {
    /// All codecs shipped with the crate, in their default order
    pub fn builtin() -> Vec<Arc<dyn Codec>> {
        vec![Arc::new(ZopfliCodec::new()), Arc::new(ZstdCodec::new())]
    }

    /// Build the set from configured extensions, keeping their order
    pub fn discover(extensions: &[String]) -> Result<Self> {
        let builtin = Self::builtin();
        let mut codecs = Vec::with_capacity(extensions.len());

        for extension in extensions {
            let codec = builtin
                .iter()
                .find(|codec| codec.extension().eq_ignore_ascii_case(extension))
                .ok_or_else(|| {
                    PrecompressError::Validation(format!("Unknown codec: {}", extension))
                })?;
            codecs.push(Arc::clone(codec));
        }

        Ok(Self::from_codecs(codecs))
    }

    /// Partition the given codecs into configured and available
    pub fn from_codecs(codecs: Vec<Arc<dyn Codec>>) -> Self {
        let available = codecs
            .iter()
            .filter(|codec| codec.is_available())
            .cloned()
            .collect();

        Self {
            configured: codecs,
            available,
        }
    }

    pub fn configured(&self) -> &[Arc<dyn Codec>] {
        &self.configured
    }

    /// Codecs that can actually run
    pub fn available(&self) -> &[Arc<dyn Codec>] {
        &self.available
    }

    /// `(codec extension, dependency)` pairs for every unavailable codec
    pub fn missing_dependencies(&self) -> Vec<(&'static str, &'static str)> {
        self.configured
            .iter()
            .flat_map(|codec| {
                let extension = codec.extension();
                codec
                    .missing_dependencies()
                    .into_iter()
                    .map(move |dependency| (extension, dependency))
            })
            .collect()
    }

    /// Extensions of every configured codec, available or not
    pub fn extensions(&self) -> Vec<&'static str> {
        self.configured.iter().map(|codec| codec.extension()).collect()
    }

    /// Suffixes that are never compression sources: every configured codec
    /// plus every builtin one, so artifacts of an earlier run with a wider
    /// codec list stay excluded
    pub fn reserved_extensions(&self) -> Vec<&'static str> {
        let mut extensions = self.extensions();
        for codec in Self::builtin() {
            let extension = codec.extension();
            if !extensions.iter().any(|e| e.eq_ignore_ascii_case(extension)) {
                extensions.push(extension);
            }
        }
        extensions
    }
}
