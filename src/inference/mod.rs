//! Inference module: from image bytes to a label and a confidence
//!
//! This module provides:
//! - Decoding and preprocessing into a fixed `[1, 3, 224, 224]` tensor
//! - The predictor (forward pass, stable softmax, argmax, label lookup)
//! - A dedicated worker thread that owns the model for the service

pub mod predictor;
pub mod preprocess;
pub mod worker;

// Re-export main types for convenience
pub use predictor::{argmax, softmax, ClassScore, Prediction, Predictor};
pub use preprocess::{decode_image, preprocess, IMAGENET_MEAN, IMAGENET_STD};
pub use worker::{InferenceHandle, InferenceWorker};
