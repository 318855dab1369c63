//! Batch module: submit a directory of images to the service and store results
//!
//! This module provides:
//! - An HTTP client for the service's health and predict routes
//! - The SQLite prediction store
//! - The sequential batch loop

pub mod client;
pub mod runner;
pub mod store;

// Re-export main types for convenience
pub use client::{mime_for_path, ClassifierClient, DEFAULT_API_URL};
pub use runner::{
    is_supported_image, list_images, run_batch, BatchConfig, BatchReport, DEFAULT_IMAGES_DIR,
};
pub use store::{PredictionRecord, PredictionStore, DEFAULT_DB_PATH};
