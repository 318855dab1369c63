//! Refund Item Classification Server
//!
//! HTTP API serving one image classifier. The model and its labels are loaded
//! once at startup; any failure there stops the process before it binds.

mod error;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use refund_classifier::backend::select_backend;
use refund_classifier::utils::logging::{init_logging, LogConfig, LogLevel};
use refund_classifier::{ClassLabels, InferenceWorker};
use tracing::{debug, info};

use crate::state::{AppState, ServerConfig};

/// Refund Item Classification Server
#[derive(Parser, Debug)]
#[command(name = "refund-classifier-server")]
#[command(version = "0.1.0")]
#[command(about = "HTTP API serving the refund item image classifier")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "REFUND_PORT", default_value = "8000")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "REFUND_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Trained model record
    #[arg(long, env = "REFUND_MODEL_PATH", default_value = "app/model/model.mpk")]
    model: PathBuf,

    /// Model architecture config (JSON); defaults apply if unset
    #[arg(long, env = "REFUND_MODEL_CONFIG")]
    model_config: Option<PathBuf>,

    /// Class label mapping file
    #[arg(long, env = "REFUND_CLASSES_PATH", default_value = "app/classes.json")]
    classes: PathBuf,

    /// Largest accepted upload, in MiB (default 10)
    #[arg(long, env = "REFUND_MAX_UPLOAD_MB")]
    max_upload_mb: Option<usize>,

    /// Minimum log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Append logs to this file instead of stdout
    #[arg(long, env = "REFUND_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_config = LogConfig::default()
        .with_level(cli.log_level)
        .with_log_file(cli.log_file.clone());
    init_logging(&log_config).map_err(anyhow::Error::msg)?;

    // Build configuration
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", cli.host, cli.port))?;
    let mut config = ServerConfig {
        addr,
        model_path: cli.model,
        model_config: cli.model_config,
        classes_path: cli.classes,
        ..ServerConfig::default()
    };

    if let Some(max_upload_mb) = cli.max_upload_mb {
        config.max_upload_bytes = max_upload_mb * 1024 * 1024;
    }

    info!("Refund Classification Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Model:   {:?}", config.model_path);
    info!("  Config:  {:?}", config.model_config);
    info!("  Classes: {:?}", config.classes_path);
    info!("  Upload limit: {} bytes", config.max_upload_bytes);
    debug!("Full configuration: {}", serde_json::to_string(&config)?);

    // Load labels and model; both are fatal on failure
    let labels = ClassLabels::load(&config.classes_path)
        .with_context(|| format!("failed to load class labels from {:?}", config.classes_path))?;
    info!("Loaded {} class labels", labels.len());

    let backend = select_backend();
    let model_path = config.model_path.clone();
    let model_config = config.model_config.clone();
    let inference = tokio::task::spawn_blocking(move || {
        InferenceWorker::spawn_on(backend, model_path, model_config, labels)
    })
    .await?
    .context("failed to load model")?;
    info!("Model loaded successfully on {}", backend);

    // Create shared state and router
    let state = Arc::new(AppState::new(inference, config));
    let app = routes::router(state);

    // Start server
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
