//! Wire types shared by the inference service and its HTTP client

use serde::{Deserialize, Serialize};

/// Message returned by the root health check
pub const WELCOME_MESSAGE: &str = "Welcome to the Refund Item Classification API";

/// Multipart field carrying the uploaded image
pub const UPLOAD_FIELD: &str = "file";

/// Error detail for an upload outside the allow-list
pub const INVALID_FILE_TYPE_DETAIL: &str = "Invalid file type. Only JPG, PNG are supported.";

/// Error detail for bytes that do not decode as an image
pub const INVALID_IMAGE_DETAIL: &str = "Uploaded file is not a valid image.";

/// Content types accepted by `POST /predict/`
pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/jpg", "image/pjpeg"];

/// Check a declared content type against the allow-list
///
/// Parameters such as `; charset=...` are ignored and the comparison is
/// case-insensitive.
pub fn is_allowed_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_CONTENT_TYPES.contains(&essence.as_str())
}

/// Round a confidence to 3 decimal places for the response body
pub fn round_confidence(confidence: f32) -> f64 {
    (f64::from(confidence) * 1000.0).round() / 1000.0
}

/// `GET /` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WelcomeResponse {
    pub message: String,
}

impl Default for WelcomeResponse {
    fn default() -> Self {
        Self {
            message: WELCOME_MESSAGE.to_string(),
        }
    }
}

/// `POST /predict/` success response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    pub predicted_class: String,
    pub confidence: f64,
}

/// Error body for every non-success response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_content_types() {
        assert!(is_allowed_content_type("image/jpeg"));
        assert!(is_allowed_content_type("image/png"));
        assert!(is_allowed_content_type("image/pjpeg"));
        assert!(is_allowed_content_type("image/jpg"));
        assert!(is_allowed_content_type("IMAGE/PNG"));
        assert!(is_allowed_content_type("image/jpeg; charset=binary"));
    }

    #[test]
    fn test_rejected_content_types() {
        assert!(!is_allowed_content_type("text/plain"));
        assert!(!is_allowed_content_type("image/gif"));
        assert!(!is_allowed_content_type("application/octet-stream"));
        assert!(!is_allowed_content_type(""));
    }

    #[test]
    fn test_round_confidence() {
        assert_eq!(round_confidence(0.98765), 0.988);
        assert_eq!(round_confidence(1.0), 1.0);
        assert_eq!(round_confidence(0.0), 0.0);
        assert_eq!(round_confidence(0.1234), 0.123);
    }

    #[test]
    fn test_prediction_response_json_shape() {
        let response = PredictionResponse {
            predicted_class: "shoe".to_string(),
            confidence: 0.912,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["predicted_class"], "shoe");
        assert_eq!(json["confidence"], 0.912);
    }

    #[test]
    fn test_welcome_default() {
        assert_eq!(WelcomeResponse::default().message, WELCOME_MESSAGE);
    }
}
