//! Batch loop: classify every image in a directory through the service

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use walkdir::WalkDir;

use super::client::{ClassifierClient, DEFAULT_API_URL};
use super::store::{PredictionStore, DEFAULT_DB_PATH};
use crate::utils::error::{ClassifierError, Result};
use crate::utils::format_duration;

/// File extensions picked up by the batch runner
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Default directory of images to classify
pub const DEFAULT_IMAGES_DIR: &str = "app/test_images";

/// Batch runner configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Base URL of the inference service
    pub api_url: String,
    /// Directory scanned for images (not recursive)
    pub images_dir: PathBuf,
    /// SQLite database path
    pub db_path: PathBuf,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            timeout: None,
        }
    }
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Image files found in the directory
    pub scanned: usize,
    /// Records written to the store
    pub saved: usize,
    /// Files that failed at any step
    pub failed: usize,
    pub elapsed: Duration,
}

/// Whether `path` has one of the accepted image extensions
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files directly inside `dir`, sorted by file name
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ClassifierError::Config(format!(
            "image directory not found: {:?}",
            dir
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ClassifierError::Io(e.into()))?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Run the batch: health gate, store init, then one request per image
///
/// Per-file failures are logged and skipped. Only a failed health check or a
/// store that cannot be opened aborts the run.
pub async fn run_batch(config: &BatchConfig) -> Result<BatchReport> {
    let start = Instant::now();
    let client = ClassifierClient::new(&config.api_url, config.timeout)?;

    info!("Checking inference service at {}", client.base_url());
    if let Err(e) = client.health().await {
        error!("API health check failed: {}", e);
        return Err(ClassifierError::ServiceUnavailable(client.base_url().to_string()));
    }
    info!("API is reachable");

    let store = PredictionStore::open(&config.db_path)?;
    info!("Database initialized at {:?}", config.db_path);

    let files = list_images(&config.images_dir)?;
    info!("Found {} images in {:?}", files.len(), config.images_dir);

    let mut report = BatchReport {
        scanned: files.len(),
        ..Default::default()
    };

    for path in &files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!(filename = %filename, "Processing");

        let prediction = match client.predict_file(path).await {
            Ok(prediction) => prediction,
            Err(ClassifierError::Rejected { status, detail }) => {
                warn!(filename = %filename, status, "Prediction failed: {}", detail);
                report.failed += 1;
                continue;
            }
            Err(e) => {
                error!(filename = %filename, "Error processing file: {}", e);
                report.failed += 1;
                continue;
            }
        };

        match store.insert(&filename, &prediction) {
            Ok(_) => {
                info!(
                    filename = %filename,
                    "Saved prediction: {} ({:.3})",
                    prediction.predicted_class,
                    prediction.confidence
                );
                report.saved += 1;
            }
            Err(e) => {
                error!(filename = %filename, "Failed to save prediction: {}", e);
                report.failed += 1;
            }
        }
    }

    report.elapsed = start.elapsed();
    info!(
        "Batch complete: {} scanned, {} saved, {} failed in {}",
        report.scanned,
        report.saved,
        report.failed,
        format_duration(report.elapsed.as_secs_f64())
    );

    Ok(report)
}
