//! Model module for the CNN classifier built with Burn
//!
//! This module provides:
//! - The refund item CNN architecture and its configuration
//! - Loading trained artifacts for inference, with a startup check that the
//!   model's output width matches the class label set

pub mod cnn;
pub mod loader;

// Re-export main types for convenience
pub use cnn::{RefundClassifier, RefundClassifierConfig};
pub use loader::load_classifier;
