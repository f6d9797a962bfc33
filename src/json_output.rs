//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON (una riga per evento)
//! per i consumatori programmatici della pipeline, ad esempio uno script di deploy.
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del run (root, codec attivi, file da elaborare)
//! - `missing_dependency`: Codec configurato ma libreria non disponibile
//! - `result`: Un tentativo (file, codec) con ratio ed esito
//! - `complete`: Fine del run con statistiche finali
//! - `clean`: Fine dell'operazione `clean`
//! - `error`: Errore fatale

use crate::compressor::{CompressionResult, Outcome};
use crate::progress::CompressionStats;
use serde::Serialize;
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del run
    Start {
        roots: Vec<PathBuf>,
        codecs: Vec<String>,
        workers: usize,
        total_files: usize,
    },

    /// Codec escluso dal set attivo
    MissingDependency { codec: String, dependency: String },

    /// Esito di un tentativo (file, codec)
    Result {
        path: PathBuf,
        codec: String,
        original_size: u64,
        compressed_size: u64,
        ratio: f64,
        kept: bool,
        outcome: Outcome,
    },

    /// Run completato
    Complete {
        #[serde(flatten)]
        stats: CompressionStats,
        duration_seconds: f64,
    },

    /// Clean completato
    Clean {
        files_removed: usize,
        bytes_freed: u64,
    },

    /// Errore generale
    Error {
        message: String,
        details: Option<String>,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Crea un messaggio di esito; `path` è già relativo alla root
    pub fn result(path: PathBuf, result: &CompressionResult) -> Self {
        Self::Result {
            path,
            codec: result.extension.to_string(),
            original_size: result.original_size,
            compressed_size: result.compressed_size,
            ratio: result.factor(),
            kept: result.kept(),
            outcome: result.outcome,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_message_shape() {
        let result = CompressionResult {
            source: PathBuf::from("/srv/static/logo.png"),
            artifact: PathBuf::from("/srv/static/logo.png.gz"),
            extension: "gz",
            original_size: 1000,
            compressed_size: 1000,
            outcome: Outcome::DiscardedNoBenefit,
            written: false,
        };

        let json = serde_json::to_value(JsonMessage::result(PathBuf::from("logo.png"), &result)).unwrap();
        assert_eq!(json["type"], "result");
        assert_eq!(json["path"], "logo.png");
        assert_eq!(json["codec"], "gz");
        assert_eq!(json["ratio"], 1.0);
        assert_eq!(json["kept"], false);
        assert_eq!(json["outcome"], "discarded_no_benefit");
    }

    #[test]
    fn test_complete_message_flattens_stats() {
        let message = JsonMessage::Complete {
            stats: CompressionStats {
                files_processed: 3,
                ..Default::default()
            },
            duration_seconds: 1.5,
        };

        let json = serde_json::to_value(message).unwrap();
        assert_eq!(json["type"], "complete");
        assert_eq!(json["files_processed"], 3);
        assert_eq!(json["duration_seconds"], 1.5);
    }
}
