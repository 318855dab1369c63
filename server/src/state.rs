//! Application state for the inference server
//!
//! Built once at startup and shared with every handler through axum `State`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use refund_classifier::InferenceHandle;
use serde::Serialize;

/// Default upload limit for `POST /predict/`
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Server configuration
#[derive(Clone, Debug, Serialize)]
pub struct ServerConfig {
    /// Address to bind
    pub addr: SocketAddr,
    /// Trained model record
    pub model_path: PathBuf,
    /// Optional model architecture config
    pub model_config: Option<PathBuf>,
    /// Class label mapping file
    pub classes_path: PathBuf,
    /// Largest accepted request body on the predict route
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            model_path: PathBuf::from("app/model/model.mpk"),
            model_config: None,
            classes_path: PathBuf::from("app/classes.json"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Shared application state
pub struct AppState {
    /// Handle to the inference worker that owns the model
    pub inference: InferenceHandle,
    /// Server configuration
    pub config: ServerConfig,
    /// Server start time
    pub started_at: Instant,
}

impl AppState {
    pub fn new(inference: InferenceHandle, config: ServerConfig) -> Self {
        Self {
            inference,
            config,
            started_at: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;
