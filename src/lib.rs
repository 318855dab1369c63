//! # Refund Item Classifier
//!
//! Image classification for returned items, built on the Burn framework.
//!
//! The crate has two consumers:
//!
//! - the inference service (`server/` in this workspace), which loads one
//!   model at startup and answers `POST /predict/` with a label and a
//!   confidence;
//! - the batch runner (`refund_classifier batch`), which walks an image
//!   directory, submits every image to the service and stores the answers in
//!   SQLite.
//!
//! ## Modules
//!
//! - `model`: CNN architecture and artifact loading
//! - `inference`: preprocessing, softmax, the predictor and its worker thread
//! - `labels`: the ordered class label set
//! - `api`: wire types shared by the service and its client
//! - `batch`: HTTP client, prediction store and the batch loop
//! - `utils`: errors, logging and formatting helpers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use refund_classifier::backend::CpuBackend;
//! use refund_classifier::{ClassLabels, Predictor};
//!
//! let labels = ClassLabels::load("app/classes.json")?;
//! let predictor = Predictor::<CpuBackend>::load(
//!     "app/model/model.mpk".as_ref(),
//!     None,
//!     labels,
//!     Default::default(),
//! )?;
//! let image = image::open("item.jpg")?;
//! let prediction = predictor.predict_image(&image)?;
//! println!("{} ({:.3})", prediction.label, prediction.confidence);
//! ```

pub mod api;
pub mod backend;
pub mod batch;
pub mod inference;
pub mod labels;
pub mod model;
pub mod utils;

// Re-export commonly used items for convenience
pub use api::{PredictionResponse, WelcomeResponse};
pub use batch::{run_batch, BatchConfig, BatchReport, ClassifierClient, PredictionStore};
pub use inference::{InferenceHandle, InferenceWorker, Prediction, Predictor};
pub use labels::ClassLabels;
pub use model::{RefundClassifier, RefundClassifierConfig};
pub use utils::error::{ClassifierError, Result};

/// Side length of the square model input
pub const IMAGE_SIZE: usize = 224;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
