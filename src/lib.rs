//! # Static Precompress Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare della pipeline di precompressione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `codec`: Trait `Codec`, codec zopfli/zstd e registro `CodecSet`
//! - `compressor`: `FileCompressor`, un codec applicato ad un file
//! - `walker`: Visita delle directory e policy di selezione
//! - `pipeline`: Driver con worker pool, cancellazione e `clean`
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `file_manager`: Naming degli artifact e scritture atomiche
//! - `progress` / `json_output`: Reporting per l'operatore
//!
//! Ogni file sorgente `app.js` può ottenere artifact fratelli `app.js.gz` e
//! `app.js.zst`; un server li sceglie in base all'`Accept-Encoding` del client.
//!
//! ## Utilizzo:
//! ```ignore
//! use static_precompress::{Config, Precompressor};
//! use tokio_util::sync::CancellationToken;
//!
//! let pipeline = Precompressor::from_config(Config::default())?;
//! let report = pipeline.run(CancellationToken::new()).await?;
//! ```

pub mod codec;
pub mod compressor;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod pipeline;
pub mod progress;
pub mod walker;

pub use codec::{Codec, CodecSet, ZopfliCodec, ZstdCodec};
pub use compressor::{CompressionResult, FileCompressor, Outcome, PendingArtifact};
pub use config::Config;
pub use error::PrecompressError;
pub use pipeline::{CleanReport, Precompressor, RunReport};
pub use progress::CompressionStats;
pub use walker::{compress_dir, SelectionPolicy};
