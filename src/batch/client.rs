//! HTTP client for the inference service
//!
//! Talks to a running classifier over its two public routes: `GET /` as a
//! health probe and `POST /predict/` with a multipart image upload.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::api::{ErrorResponse, PredictionResponse, WelcomeResponse, UPLOAD_FIELD};
use crate::utils::error::{ClassifierError, Result};

/// Default inference service URL
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// MIME type sent for a file, derived from its extension
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

/// Client for the refund classifier API
#[derive(Clone)]
pub struct ClassifierClient {
    base_url: String,
    client: reqwest::Client,
}

impl ClassifierClient {
    /// Create a client for `base_url`
    ///
    /// `timeout` bounds every request; `None` waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check the root route answers 200 with the welcome body
    pub async fn health(&self) -> Result<WelcomeResponse> {
        let url = format!("{}/", self.base_url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Upload a file from disk and return the service's prediction
    pub async fn predict_file(&self, path: &Path) -> Result<PredictionResponse> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.predict_bytes(&filename, bytes, mime_for_path(path)).await
    }

    /// Upload raw bytes under `filename` with the declared `content_type`
    pub async fn predict_bytes(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<PredictionResponse> {
        let url = format!("{}/predict/", self.base_url);
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.detail)
                .unwrap_or(body);
            debug!(status = status.as_u16(), filename, "Prediction rejected");
            return Err(ClassifierError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response.json().await?)
    }
}

impl Default for ClassifierClient {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }
}
