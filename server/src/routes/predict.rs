//! Prediction endpoint - classify one uploaded image

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use refund_classifier::api::{is_allowed_content_type, round_confidence, UPLOAD_FIELD};
use refund_classifier::inference::decode_image;
use refund_classifier::utils::format_percent;
use refund_classifier::{ClassifierError, PredictionResponse};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::state::SharedState;

/// POST /predict/ - Classify the image in multipart field `file`
///
/// The declared content type is checked before the bytes are read, and the
/// bytes are decoded before the model sees them; both failures are 400s.
pub async fn predict(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::unprocessable(e.body_text()))?;

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?
            .ok_or_else(|| ApiError::unprocessable(format!("Missing upload field '{}'", UPLOAD_FIELD)))?;

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        info!(filename = %filename, "Received file");

        if !is_allowed_content_type(&content_type) {
            warn!(filename = %filename, "Invalid file type: {}", content_type);
            return Err(ClassifierError::UnsupportedMediaType(content_type).into());
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;

        let image = tokio::task::spawn_blocking(move || decode_image(&bytes))
            .await
            .map_err(|e| ApiError::internal(format!("Decode task failed: {}", e)))?
            .map_err(|e| {
                warn!(filename = %filename, "Invalid image file: {}", e);
                ApiError::from(e)
            })?;

        let prediction = state.inference.predict(image).await.map_err(|e| {
            error!(filename = %filename, "Prediction failed: {}", e);
            ApiError::from(e)
        })?;

        info!(
            "File: {} | Prediction: {} | Confidence: {}",
            filename,
            prediction.label,
            format_percent(prediction.confidence)
        );

        return Ok(Json(PredictionResponse {
            predicted_class: prediction.label,
            confidence: round_confidence(prediction.confidence),
        }));
    }
}
