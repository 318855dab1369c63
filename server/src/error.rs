//! HTTP error responses
//!
//! Every failure leaves the server as `{"detail": "..."}` with a status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use refund_classifier::api::{ErrorResponse, INVALID_FILE_TYPE_DETAIL, INVALID_IMAGE_DETAIL};
use refund_classifier::ClassifierError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }
}

/// Caller mistakes become 400s with a fixed detail, everything else is a 500
impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::UnsupportedMediaType(_) => Self::bad_request(INVALID_FILE_TYPE_DETAIL),
            ClassifierError::Decode(_) => Self::bad_request(INVALID_IMAGE_DETAIL),
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}
