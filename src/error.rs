//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della pipeline.
//!
//! ## Responsabilità:
//! - Definisce `PrecompressError` per categorizzare gli errori fatali
//! - Mantiene il path coinvolto per messaggi di errore chiari
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io`: Lettura sorgente o scrittura artifact fallita (fatale, interrompe il run)
//! - `Walk`: Errore durante la visita di una directory
//! - `Codec`: Il codec ha fallito la compressione
//! - `MissingDependency`: Libreria di compressione non compilata nel binario
//! - `Validation`: Errori di validazione della configurazione
//! - `Cancelled`: Run interrotto tramite cancellation token
//!
//! Nota: "nessun beneficio dalla compressione" NON è un errore, è un risultato
//! normale (`Outcome::DiscardedNoBenefit`).

use std::path::PathBuf;

/// Fatal errors of a precompression run
#[derive(thiserror::Error, Debug)]
pub enum PrecompressError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Codec {codec} failed: {message}")]
    Codec { codec: &'static str, message: String },

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl PrecompressError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PrecompressError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = PrecompressError::io(
            "/static/app.js",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let message = err.to_string();
        assert!(message.contains("/static/app.js"));
        assert!(message.contains("gone"));
    }
}
