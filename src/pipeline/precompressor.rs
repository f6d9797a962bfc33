//! # Precompressor Main Orchestrator
//!
//! Orchestratore principale che enumera le root degli asset statici,
//! distribuisce i file su un pool di worker limitato e riporta ogni risultato.
//!
//! ## Flusso di esecuzione (`run`):
//! 1. **Dependency check**: Segnala i codec configurati ma non disponibili
//! 2. **File discovery**: Trova i file sorgente eleggibili in ogni root
//! 3. **Parallel processing**: Un task per file, limitato da un semaforo
//! 4. **Reporting**: Progress bar o eventi JSON per ogni risultato
//! 5. **Statistics**: Report finale con byte risparmiati e scritture
//!
//! ## Gestione concorrenza:
//! - Semaforo con `workers` permessi (default: core disponibili)
//! - Compressione CPU-bound su `spawn_blocking`
//! - Il tie-break dei file binari resta locale al task del file
//! - Tutti i task vengono attesi prima di restituire il report
//!
//! ## Cancellazione ed errori:
//! - Il `CancellationToken` viene controllato prima di iniziare ogni file;
//!   i file già in lavorazione terminano, nessun artifact resta a metà
//! - Il primo errore fatale cancella il resto del run (fail-fast)
//!
//! ## Clean:
//! - Elimina ogni file con il suffisso di un codec configurato
//! - Idempotente: nessun errore se non c'è nulla da eliminare

use crate::{
    codec::CodecSet,
    compressor::{CompressionResult, FileCompressor},
    config::Config,
    error::{PrecompressError, Result},
    file_manager::FileManager,
    json_output::JsonMessage,
    pipeline::progress_tracker::ProgressTracker,
    progress::CompressionStats,
    walker::{compressors_for, process_file, SelectionPolicy, SourceFiles},
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of a full compression run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Every result, sorted by source path then codec extension
    pub results: Vec<CompressionResult>,
    pub stats: CompressionStats,
}

/// Outcome of a clean
#[derive(Debug, Default)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
    pub bytes_freed: u64,
}

/// Orchestratore principale
pub struct Precompressor {
    config: Config,
    codecs: CodecSet,
    policy: Arc<SelectionPolicy>,
    compressors: Arc<Vec<FileCompressor>>,
}

impl Precompressor {
    /// Crea nuova istanza a partire da config e codec già scoperti
    pub fn new(config: Config, codecs: CodecSet) -> anyhow::Result<Self> {
        config.validate()?;
        let policy = Arc::new(SelectionPolicy::from_config(&config, &codecs));
        let compressors = Arc::new(compressors_for(&codecs));

        Ok(Self {
            config,
            codecs,
            policy,
            compressors,
        })
    }

    /// Shortcut: discover the codecs named in the config
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let codecs = CodecSet::discover(&config.codecs)?;
        Self::new(config, codecs)
    }

    pub fn codecs(&self) -> &CodecSet {
        &self.codecs
    }

    /// Segnala i codec esclusi per dipendenze mancanti
    pub fn report_missing_dependencies(&self) {
        for (codec, dependency) in self.codecs.missing_dependencies() {
            if self.config.json_output {
                JsonMessage::MissingDependency {
                    codec: codec.to_string(),
                    dependency: dependency.to_string(),
                }
                .emit();
            } else {
                warn!(
                    "Codec .{} disabled: dependency '{}' not available",
                    codec, dependency
                );
            }
        }
    }

    /// Root configurate che esistono su disco
    fn existing_roots(&self) -> Vec<PathBuf> {
        self.config
            .roots
            .iter()
            .filter(|root| {
                let exists = root.exists();
                if !exists {
                    warn!("Skipping missing root: {}", root.display());
                }
                exists
            })
            .cloned()
            .collect()
    }

    /// Esegue la compressione di tutte le root
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunReport> {
        let start_time = Instant::now();
        self.report_missing_dependencies();

        if self.compressors.is_empty() {
            warn!("No codec available, nothing to compress");
            return Ok(RunReport::default());
        }

        let roots = self.existing_roots();
        let policy = Arc::clone(&self.policy);
        let files = tokio::task::spawn_blocking(move || discover_sources(&roots, &policy)).await??;

        self.emit_start(files.len());

        let tracker = ProgressTracker::new(files.len(), self.config.json_output);
        let results = self.process_files_concurrently(files, &tracker, &cancel).await;

        let stats = tracker.get_stats().await;
        tracker.finish(&stats.format_summary());

        let mut results = results?;
        if cancel.is_cancelled() {
            warn!("Run cancelled after {} files", stats.files_processed);
            return Err(PrecompressError::Cancelled);
        }

        results.sort_by(|a, b| {
            a.source
                .cmp(&b.source)
                .then_with(|| a.extension.cmp(b.extension))
        });

        self.print_final_stats(&stats, start_time.elapsed().as_secs_f64());
        Ok(RunReport { results, stats })
    }

    fn emit_start(&self, total_files: usize) {
        let codecs: Vec<String> = self
            .compressors
            .iter()
            .map(|c| c.extension().to_string())
            .collect();

        if self.config.json_output {
            JsonMessage::Start {
                roots: self.config.roots.clone(),
                codecs,
                workers: self.config.workers,
                total_files,
            }
            .emit();
        } else {
            info!(
                "Compressing {} files with [{}] using {} workers",
                total_files,
                codecs.join(", "),
                self.config.workers
            );
        }
    }

    /// Processa i file con un task per file, limitati dal semaforo
    async fn process_files_concurrently(
        &self,
        files: Vec<(PathBuf, PathBuf)>,
        tracker: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> Result<Vec<CompressionResult>> {
        // Cancelled on the first fatal error, without touching the caller's token
        let run_token = cancel.child_token();
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let mut tasks: JoinSet<Result<Vec<CompressionResult>>> = JoinSet::new();

        for (root, source) in files {
            let permit = tokio::select! {
                biased;
                _ = run_token.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => permit,
            };
            let Ok(permit) = permit else { break };

            let compressors = Arc::clone(&self.compressors);
            let policy = Arc::clone(&self.policy);
            let tracker = tracker.clone();
            let token = run_token.clone();

            tasks.spawn(async move {
                let _permit = permit;
                if token.is_cancelled() {
                    return Ok(Vec::new());
                }

                let path = source.clone();
                let processed = tokio::task::spawn_blocking(move || {
                    process_file(&path, &compressors, &policy)
                })
                .await
                .map_err(PrecompressError::from)
                .and_then(|result| result);

                match processed {
                    Ok(results) => {
                        tracker.handle_file_completion(&root, &source, &results).await;
                        Ok(results)
                    }
                    Err(e) => {
                        token.cancel();
                        tracker.handle_file_error(&source, &e).await;
                        Err(e)
                    }
                }
            });
        }

        let mut all_results = Vec::new();
        let mut first_error = None;

        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(PrecompressError::from).and_then(|result| result) {
                Ok(results) => all_results.extend(results),
                Err(e) => {
                    run_token.cancel();
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(all_results),
        }
    }

    fn print_final_stats(&self, stats: &CompressionStats, duration_seconds: f64) {
        if self.config.json_output {
            JsonMessage::Complete {
                stats: stats.clone(),
                duration_seconds,
            }
            .emit();
        } else {
            info!("{}", stats.format_summary());
            info!("Completed in {:.2}s", duration_seconds);
        }
    }

    /// Elimina tutti gli artifact prodotti dai codec configurati
    pub async fn clean(&self) -> Result<CleanReport> {
        let roots = self.existing_roots();
        let extensions: Vec<String> = self
            .codecs
            .extensions()
            .into_iter()
            .map(|ext| ext.to_ascii_lowercase())
            .collect();

        let report = tokio::task::spawn_blocking(move || remove_artifacts(&roots, &extensions)).await??;

        if self.config.json_output {
            JsonMessage::Clean {
                files_removed: report.removed.len(),
                bytes_freed: report.bytes_freed,
            }
            .emit();
        } else {
            info!(
                "Removed {} artifacts ({})",
                report.removed.len(),
                FileManager::format_size(report.bytes_freed)
            );
        }

        Ok(report)
    }
}

/// Eligible `(root, source)` pairs across every root
fn discover_sources(roots: &[PathBuf], policy: &SelectionPolicy) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut files = Vec::new();
    for root in roots {
        for source in SourceFiles::new(root, policy) {
            files.push((root.clone(), source?));
        }
    }
    Ok(files)
}

/// Artifacts of a single-file root live next to it, not under it
fn artifacts_of_root(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(extensions
            .iter()
            .map(|ext| FileManager::sibling_path(root, ext))
            .filter(|artifact| artifact.is_file())
            .collect());
    }

    let set: HashSet<String> = extensions.iter().cloned().collect();
    FileManager::find_artifacts(root, &set)
}

fn remove_artifacts(roots: &[PathBuf], extensions: &[String]) -> Result<CleanReport> {
    let mut report = CleanReport::default();

    for root in roots {
        for artifact in artifacts_of_root(root, extensions)? {
            let size = artifact.metadata().map(|m| m.len()).unwrap_or(0);
            if FileManager::remove_if_exists(&artifact)? {
                debug!("Removed {}", artifact.display());
                report.bytes_freed += size;
                report.removed.push(artifact);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::FixedCodec;
    use crate::codec::Codec;
    use std::fs;
    use tempfile::TempDir;

    fn precompressor(roots: Vec<PathBuf>, workers: usize) -> Precompressor {
        let config = Config {
            roots,
            workers,
            json_output: true,
            ..Default::default()
        };
        let codecs = CodecSet::from_codecs(vec![
            Arc::new(FixedCodec { extension: "gz", ratio: 0.9, available: true }),
            Arc::new(FixedCodec { extension: "zst", ratio: 0.5, available: true }),
        ]);
        Precompressor::new(config, codecs).unwrap()
    }

    #[tokio::test]
    async fn test_run_processes_every_root() {
        let temp_dir = TempDir::new().unwrap();
        let static_dir = temp_dir.path().join("static");
        fs::create_dir(&static_dir).unwrap();
        fs::write(static_dir.join("app.js"), vec![b'a'; 200]).unwrap();
        fs::write(static_dir.join("logo.png"), vec![0u8; 200]).unwrap();
        let humans = temp_dir.path().join("humans.txt");
        fs::write(&humans, vec![b'h'; 200]).unwrap();

        let pipeline = precompressor(
            vec![static_dir.clone(), humans.clone(), temp_dir.path().join("missing")],
            2,
        );
        let report = pipeline.run(CancellationToken::new()).await.unwrap();

        assert_eq!(report.stats.files_processed, 3);
        assert_eq!(report.stats.artifacts_kept, 5);
        assert_eq!(report.stats.discarded_lost_tie_break, 1);
        assert!(static_dir.join("app.js.gz").exists());
        assert!(static_dir.join("logo.png.zst").exists());
        assert!(!static_dir.join("logo.png.gz").exists());
        assert!(temp_dir.path().join("humans.txt.zst").exists());
    }

    #[tokio::test]
    async fn test_cancelled_run_processes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("app.js"), vec![b'a'; 200]).unwrap();

        let token = CancellationToken::new();
        token.cancel();

        let pipeline = precompressor(vec![temp_dir.path().to_path_buf()], 1);
        let err = pipeline.run(token).await.unwrap_err();

        assert!(matches!(err, PrecompressError::Cancelled));
        assert!(!temp_dir.path().join("app.js.gz").exists());
    }

    #[tokio::test]
    async fn test_clean_single_file_root_and_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let humans = temp_dir.path().join("humans.txt");
        fs::write(&humans, vec![b'h'; 200]).unwrap();

        let pipeline = precompressor(vec![humans.clone()], 1);
        pipeline.run(CancellationToken::new()).await.unwrap();
        assert!(temp_dir.path().join("humans.txt.gz").exists());

        let report = pipeline.clean().await.unwrap();
        assert_eq!(report.removed.len(), 2);
        assert!(humans.exists());

        let again = pipeline.clean().await.unwrap();
        assert!(again.removed.is_empty());
    }

    #[tokio::test]
    async fn test_no_available_codec_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("app.js"), vec![b'a'; 200]).unwrap();

        let config = Config {
            roots: vec![temp_dir.path().to_path_buf()],
            json_output: true,
            ..Default::default()
        };
        let codecs = CodecSet::from_codecs(vec![Arc::new(FixedCodec {
            extension: "gz",
            ratio: 0.5,
            available: false,
        })]);

        let report = Precompressor::new(config, codecs)
            .unwrap()
            .run(CancellationToken::new())
            .await
            .unwrap();
        assert!(report.results.is_empty());
        assert!(!temp_dir.path().join("app.js.gz").exists());
    }

    /// Cancels the run from inside the first compression
    #[derive(Debug)]
    struct CancellingCodec {
        token: CancellationToken,
    }

    impl Codec for CancellingCodec {
        fn extension(&self) -> &'static str {
            "gz"
        }

        fn name(&self) -> &'static str {
            "cancelling"
        }

        fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
            self.token.cancel();
            Ok(vec![b'x'; data.len() / 2])
        }

        fn missing_dependencies(&self) -> Vec<&'static str> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn test_first_error_stops_remaining_files() {
        let temp_dir = TempDir::new().unwrap();
        for i in 1..=6 {
            fs::write(temp_dir.path().join(format!("f{}.css", i)), vec![b'c'; 200]).unwrap();
        }
        // The zst artifact of f3 cannot be written
        fs::create_dir(temp_dir.path().join("f3.css.zst")).unwrap();

        let pipeline = precompressor(vec![temp_dir.path().to_path_buf()], 1);
        let err = pipeline.run(CancellationToken::new()).await.unwrap_err();

        match err {
            PrecompressError::Io { path, .. } => assert_eq!(path, temp_dir.path().join("f3.css.zst")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(temp_dir.path().join("f1.css.zst").exists());
        assert!(temp_dir.path().join("f2.css.zst").exists());
        for i in 4..=6 {
            assert!(!temp_dir.path().join(format!("f{}.css.gz", i)).exists());
            assert!(!temp_dir.path().join(format!("f{}.css.zst", i)).exists());
        }
    }

    #[tokio::test]
    async fn test_cancel_mid_run_finishes_in_flight_file() {
        let temp_dir = TempDir::new().unwrap();
        for i in 1..=4 {
            fs::write(temp_dir.path().join(format!("a{}.js", i)), vec![b'a'; 200]).unwrap();
        }

        let token = CancellationToken::new();
        let config = Config {
            roots: vec![temp_dir.path().to_path_buf()],
            workers: 1,
            json_output: true,
            ..Default::default()
        };
        let codecs = CodecSet::from_codecs(vec![Arc::new(CancellingCodec {
            token: token.clone(),
        })]);
        let pipeline = Precompressor::new(config, codecs).unwrap();

        let err = pipeline.run(token).await.unwrap_err();
        assert!(matches!(err, PrecompressError::Cancelled));

        // The file in flight is complete, nothing after it was started
        assert_eq!(fs::read(temp_dir.path().join("a1.js.gz")).unwrap(), vec![b'x'; 100]);
        for i in 2..=4 {
            assert!(!temp_dir.path().join(format!("a{}.js.gz", i)).exists());
        }

        let mut names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a1.js", "a1.js.gz", "a2.js", "a3.js", "a4.js"]);
    }
}
