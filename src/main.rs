//! # Static Precompress - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Merge di file di configurazione e flag CLI
//! - Ctrl-C collegato al cancellation token del run
//!
//! ## Esempio di utilizzo:
//! ```bash
//! precompress --root static --root humans.txt --workers 8
//! precompress clean --root static
//! precompress --config precompress.json --json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use static_precompress::{json_output::JsonMessage, Config, Precompressor};

#[derive(Parser)]
#[command(name = "precompress")]
#[command(about = "Precompress static assets into .gz and .zst siblings")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Static-asset root, directory or single file (repeatable)
    #[arg(short, long, global = true)]
    root: Vec<PathBuf>,

    /// Number of parallel workers
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Codec suffix to run, in order (repeatable)
    #[arg(long, global = true)]
    codec: Vec<String>,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output results as JSON lines on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Compress every eligible file (default)
    Compress,
    /// Delete every compressed artifact under the roots
    Clean,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so JSON output on stdout stays parseable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.verbose { "debug" } else { "info" })
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match args.config {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    if !args.root.is_empty() {
        config.roots = args.root.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if !args.codec.is_empty() {
        config.codecs = args.codec.clone();
    }
    config.json_output |= args.json;
    let json_output = config.json_output;

    let precompressor = Precompressor::from_config(config)?;

    let outcome = match args.command.unwrap_or(Command::Compress) {
        Command::Compress => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, finishing files in progress");
                    on_interrupt.cancel();
                }
            });
            precompressor.run(cancel).await.map(|_| ())
        }
        Command::Clean => precompressor.clean().await.map(|_| ()),
    };

    if let Err(ref e) = outcome {
        if json_output {
            JsonMessage::error(e.to_string(), None).emit();
        }
    }

    Ok(outcome?)
}
