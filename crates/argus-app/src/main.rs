//! Argus - image content analysis service.
//!
//! Runs the HTTP API server, or analyzes a single image from the command
//! line and prints the report as JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use argus_core::ocr::TesseractEngine;
use argus_core::{AnalysisOptions, Analyzer, AnalyzerConfig, Catalog, ThresholdConfig};
use argus_server::{AppState, Server, ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use clap::{Parser, Subcommand};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Argus - classify screenshots for explicit content, games, and text
#[derive(Parser, Debug)]
#[command(name = "argus", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON catalog replacing the built-in keyword tables
    #[arg(long, global = true, env = "ARGUS_CATALOG")]
    catalog: Option<PathBuf>,

    /// Tesseract executable used for OCR
    #[arg(long, global = true, env = "ARGUS_TESSERACT", default_value = "tesseract")]
    tesseract: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Also write daily-rotated logs into this directory
    #[arg(long, global = true, env = "ARGUS_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, env = "ARGUS_HOST", default_value = DEFAULT_HOST)]
        host: String,

        /// Port to bind to
        #[arg(long, env = "ARGUS_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Accepted API key (repeatable); none disables the check
        #[arg(long = "api-key", env = "ARGUS_API_KEYS", value_delimiter = ',')]
        api_keys: Vec<String>,
    },

    /// Analyze one image and print the report
    Analyze {
        /// Image file to analyze
        file: PathBuf,

        /// Write the redacted image here as PNG
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip redaction
        #[arg(long)]
        no_blur: bool,

        /// Skip the executive summary
        #[arg(long)]
        no_summary: bool,

        /// Sensitivity level echoed in the report metadata
        #[arg(long, default_value = "medium")]
        sensitivity: String,
    },
}

/// Initialize logging, optionally with file rotation.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("argus={},warn", log_level)));

    if let Some(log_dir) = &args.log_dir {
        if std::fs::create_dir_all(log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("argus")
                .filename_suffix("log")
                .build(log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stderr))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                tracing::info!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        tracing::warn!("File logging unavailable, using console only");
        return None;
    }

    // Reports go to stdout, so logs stay on stderr
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    None
}

/// Loads configuration and builds the analyzer. Any invalid setting aborts
/// startup.
fn build_analyzer(args: &Args) -> Result<Analyzer> {
    let thresholds = ThresholdConfig::from_env().context("invalid threshold configuration")?;

    let catalog = match &args.catalog {
        Some(path) => Catalog::from_json_file(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => Catalog::default(),
    };

    let engine = TesseractEngine::with_binary(args.tesseract.clone());
    tracing::debug!(?thresholds, engine = %engine.binary, "analyzer configuration");

    Ok(Analyzer::new(
        AnalyzerConfig::from_env(),
        thresholds,
        catalog,
        Arc::new(engine),
    ))
}

async fn serve(analyzer: Analyzer, host: String, port: u16, api_keys: Vec<String>) -> Result<()> {
    let api_keys: Vec<String> = api_keys
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if api_keys.is_empty() {
        tracing::warn!("No API keys configured, authentication disabled");
    } else {
        tracing::info!(keys = api_keys.len(), "API key authentication enabled");
    }

    let config = ServerConfig {
        host,
        port,
        max_upload_bytes: AnalyzerConfig::from_env().max_image_bytes,
    };
    let server = Server::new(config, AppState::with_api_keys(analyzer, api_keys))?;
    server.run().await?;
    Ok(())
}

fn analyze(
    analyzer: &Analyzer,
    file: &Path,
    output: Option<&Path>,
    options: &AnalysisOptions,
) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let report = analyzer
        .analyze(&bytes, options)
        .with_context(|| format!("failed to analyze {}", file.display()))?;

    if let Some(path) = output {
        match &report.blur_info {
            Some(blur) => {
                let png = blur.encode_png().context("failed to encode redacted image")?;
                std::fs::write(path, png)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                tracing::info!(path = %path.display(), level = ?blur.level, "wrote redacted image");
            }
            None => tracing::info!("Nothing to redact, no image written"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(&args);

    tracing::info!("Starting Argus v{}", env!("CARGO_PKG_VERSION"));

    let analyzer = build_analyzer(&args)?;

    match args.command {
        Command::Serve {
            host,
            port,
            api_keys,
        } => serve(analyzer, host, port, api_keys).await,
        Command::Analyze {
            file,
            output,
            no_blur,
            no_summary,
            sensitivity,
        } => {
            let options = AnalysisOptions {
                blur_enabled: !no_blur,
                include_summary: !no_summary,
                sensitivity_level: sensitivity,
            };
            tokio::task::spawn_blocking(move || {
                analyze(&analyzer, &file, output.as_deref(), &options)
            })
            .await?
        }
    }
}
