//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione della pipeline.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con le root degli asset e le policy
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `roots`: Directory o singoli file da comprimere (default: `static`, `humans.txt`)
//! - `workers`: Numero di worker paralleli (default: core disponibili)
//! - `codecs`: Suffissi dei codec, nell'ordine di esecuzione (default: `gz`, `zst`)
//! - `binary_extensions`: Estensioni per cui si tiene al massimo un artifact
//! - `ignored_extensions`: Estensioni mai compresse (oltre ai suffissi dei codec)
//! - `json_output`: Eventi JSON su stdout al posto della progress bar
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     roots: vec![PathBuf::from("public")],
//!     workers: 8,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Audio, image, font and bundled-binary formats
pub const DEFAULT_BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "avif", "ico", "bmp", "mp3", "ogg", "opus", "wav",
    "flac", "m4a", "mp4", "webm", "woff", "woff2", "ttf", "otf", "eot", "wasm", "pdf", "zip",
];

/// Never compression sources, on top of the codec suffixes
pub const DEFAULT_IGNORED_EXTENSIONS: &[&str] = &["map", "br", "bz2", "xz", "7z"];

pub const DEFAULT_CODECS: &[&str] = &["gz", "zst"];

/// Configuration for a precompression run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Static-asset roots: directories or single files
    pub roots: Vec<PathBuf>,
    /// Number of parallel workers
    pub workers: usize,
    /// Codec suffixes, in the order they run
    pub codecs: Vec<String>,
    /// Extensions for which at most one artifact is kept
    pub binary_extensions: Vec<String>,
    /// Extensions that are never compressed
    pub ignored_extensions: Vec<String>,
    /// Output progress and results as JSON lines
    pub json_output: bool,
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from("static"), PathBuf::from("humans.txt")],
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            codecs: to_strings(DEFAULT_CODECS),
            binary_extensions: to_strings(DEFAULT_BINARY_EXTENSIONS),
            ignored_extensions: to_strings(DEFAULT_IGNORED_EXTENSIONS),
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.roots.is_empty() {
            return Err(anyhow::anyhow!("At least one root must be configured"));
        }

        for (index, codec) in self.codecs.iter().enumerate() {
            if self.codecs[..index]
                .iter()
                .any(|other| other.eq_ignore_ascii_case(codec))
            {
                return Err(anyhow::anyhow!("Codec listed twice: {}", codec));
            }
        }

        for extension in self
            .codecs
            .iter()
            .chain(&self.binary_extensions)
            .chain(&self.ignored_extensions)
        {
            if extension.is_empty() || extension.starts_with('.') {
                return Err(anyhow::anyhow!(
                    "Extensions must be non-empty and without a leading dot: {:?}",
                    extension
                ));
            }
        }

        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 2;
        config.codecs = vec!["gz".to_string(), "GZ".to_string()];
        assert!(config.validate().is_err());

        config.codecs = vec!["gz".to_string()];
        config.binary_extensions = vec![".png".to_string()];
        assert!(config.validate().is_err());

        config.binary_extensions = Vec::new();
        config.roots = Vec::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.codecs, vec!["gz", "zst"]);
        assert!(config.workers > 0);
        assert!(config.binary_extensions.contains(&"png".to_string()));
        assert!(config.ignored_extensions.contains(&"map".to_string()));
        assert!(!config.json_output);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            roots: vec![PathBuf::from("public"), PathBuf::from("robots.txt")],
            workers: 8,
            codecs: vec!["zst".to_string()],
            json_output: true,
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.roots, original_config.roots);
        assert_eq!(loaded_config.workers, 8);
        assert_eq!(loaded_config.codecs, vec!["zst"]);
        assert!(loaded_config.json_output);
    }

    #[tokio::test]
    async fn test_partial_config_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{"roots": ["assets"]}"#).await.unwrap();

        let config = Config::from_file(&config_path).await.unwrap();
        assert_eq!(config.roots, vec![PathBuf::from("assets")]);
        assert_eq!(config.codecs, vec!["gz", "zst"]);
    }

    #[tokio::test]
    async fn test_missing_config_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("nope.json")).await.unwrap();
        assert_eq!(config.codecs, Config::default().codecs);
    }
}
