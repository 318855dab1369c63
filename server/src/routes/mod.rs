//! API routes

pub mod health;
pub mod predict;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

/// Build the service router
pub fn router(state: SharedState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        // Health check
        .route("/", get(health::root))
        .route("/health", get(health::health_check))

        // Prediction, with and without the trailing slash
        .route("/predict/", post(predict::predict).layer(upload_limit.clone()))
        .route("/predict", post(predict::predict).layer(upload_limit))

        // Add state
        .with_state(state)

        // Add middleware
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use refund_classifier::backend::CpuBackend;
    use refund_classifier::{ClassLabels, InferenceWorker, Predictor, RefundClassifierConfig};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::state::{AppState, ServerConfig};

    const BOUNDARY: &str = "refund-test-boundary";
    const LABELS: [&str; 3] = ["bag", "shirt", "shoe"];

    fn test_app() -> Router {
        let inference = InferenceWorker::spawn(|| {
            let labels = ClassLabels::from_names(LABELS)?;
            let device = Default::default();
            let model = RefundClassifierConfig::new(labels.len())
                .with_base_filters(4)
                .with_hidden_units(8)
                .init::<CpuBackend>(&device);
            Predictor::new(model, labels, device)
        })
        .unwrap();

        router(Arc::new(AppState::new(inference, ServerConfig::default())))
    }

    fn multipart_request(uri: &str, field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn png_bytes() -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(40, 30, |x, y| Rgb([x as u8 * 5, y as u8 * 7, 90])));
        let mut buffer = Vec::new();
        image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png).unwrap();
        buffer
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_welcome() {
        let response = test_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Welcome to the Refund Item Classification API");
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], "0.1.0");
    }

    #[tokio::test]
    async fn test_predict_valid_png() {
        for uri in ["/predict/", "/predict"] {
            let request = multipart_request(uri, "file", "item.png", "image/png", &png_bytes());
            let response = test_app().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let body = json_body(response).await;
            let class = body["predicted_class"].as_str().unwrap();
            assert!(LABELS.contains(&class));
            let confidence = body["confidence"].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&confidence));
            assert_eq!((confidence * 1000.0).round() / 1000.0, confidence);
        }
    }

    #[tokio::test]
    async fn test_predict_rejects_text_upload() {
        let request = multipart_request("/predict/", "file", "notes.txt", "text/plain", b"hello");
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["detail"], "Invalid file type. Only JPG, PNG are supported.");
    }

    #[tokio::test]
    async fn test_predict_rejects_corrupt_jpeg() {
        let corrupt = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01];
        let request = multipart_request("/predict/", "file", "broken.jpg", "image/jpeg", &corrupt);
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["detail"], "Uploaded file is not a valid image.");
    }

    #[tokio::test]
    async fn test_predict_missing_file_field() {
        let request = multipart_request("/predict/", "image", "item.png", "image/png", &png_bytes());
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json_body(response).await["detail"].is_string());
    }

    #[tokio::test]
    async fn test_predict_without_multipart_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/predict/")
            .body(Body::from("not multipart"))
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
