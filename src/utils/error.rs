//! Error Handling Module
//!
//! Defines the error type shared by the inference service, the predictor and
//! the batch runner. Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for refund classifier operations
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Bytes could not be decoded into an image
    #[error("Uploaded file is not a valid image: {0}")]
    Decode(String),

    /// Declared content type is not on the allow-list
    #[error("Invalid file type '{0}'. Only JPG, PNG are supported.")]
    UnsupportedMediaType(String),

    /// Error loading or validating the class label set
    #[error("Label error: {0}")]
    Labels(String),

    /// Model artifact does not exist
    #[error("Model artifact not found: {0}")]
    ModelNotFound(PathBuf),

    /// Error building or deserializing the model
    #[error("Model error: {0}")]
    Model(String),

    /// Label count does not match the model's output dimension
    #[error("Model produces {outputs} classes but {labels} labels were loaded")]
    LabelMismatch { labels: usize, outputs: usize },

    /// Error during the forward pass or its post-processing
    #[error("Prediction failed: {0}")]
    Inference(String),

    /// SQLite error
    #[error("Database error: {0}")]
    Store(#[from] rusqlite::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Service rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The service did not pass its health check
    #[error("Service unavailable at {0}")]
    ServiceUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for refund classifier operations
pub type Result<T> = std::result::Result<T, ClassifierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClassifierError::Inference("shape mismatch".to_string());
        assert_eq!(format!("{}", err), "Prediction failed: shape mismatch");
    }

    #[test]
    fn test_model_not_found_mentions_path() {
        let err = ClassifierError::ModelNotFound(PathBuf::from("/models/model.mpk"));
        assert!(format!("{}", err).contains("model.mpk"));
    }

    #[test]
    fn test_label_mismatch_display() {
        let err = ClassifierError::LabelMismatch {
            labels: 4,
            outputs: 5,
        };
        assert_eq!(
            format!("{}", err),
            "Model produces 5 classes but 4 labels were loaded"
        );
    }

    #[test]
    fn test_unsupported_media_type_names_the_type() {
        let err = ClassifierError::UnsupportedMediaType("text/plain".into());
        assert_eq!(
            format!("{}", err),
            "Invalid file type 'text/plain'. Only JPG, PNG are supported."
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ClassifierError = io.into();
        assert!(matches!(err, ClassifierError::Io(_)));
    }
}
