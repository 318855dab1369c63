//! Model artifact loading
//!
//! Artifacts are Burn `CompactRecorder` records (`.mpk`). The architecture
//! comes from an optional `RefundClassifierConfig` JSON file, falling back to
//! the default architecture sized to the label set.

use std::path::Path;

use burn::config::Config;
use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::{backend::Backend, Tensor};
use tracing::{debug, info};

use super::cnn::{RefundClassifier, RefundClassifierConfig};
use crate::utils::error::{ClassifierError, Result};
use crate::IMAGE_SIZE;

/// Resolve the architecture config for `num_classes` labels
pub fn resolve_config(config_path: Option<&Path>, num_classes: usize) -> Result<RefundClassifierConfig> {
    let config = match config_path {
        Some(path) => RefundClassifierConfig::load(path).map_err(|e| {
            ClassifierError::Config(format!("failed to read model config {:?}: {}", path, e))
        })?,
        None => RefundClassifierConfig::new(num_classes),
    };

    if config.num_classes != num_classes {
        return Err(ClassifierError::LabelMismatch {
            labels: num_classes,
            outputs: config.num_classes,
        });
    }

    Ok(config)
}

/// Load a trained classifier for inference
///
/// The record is loaded on `device` and a probe forward pass checks that the
/// model emits exactly `num_classes` logits. Any failure means the service
/// must not start.
pub fn load_classifier<B: Backend>(
    weights_path: &Path,
    config_path: Option<&Path>,
    num_classes: usize,
    device: &B::Device,
) -> Result<RefundClassifier<B>> {
    if !weights_path.exists() {
        return Err(ClassifierError::ModelNotFound(weights_path.to_path_buf()));
    }

    let config = resolve_config(config_path, num_classes)?;
    debug!("Model config: {:?}", config);

    let model = RefundClassifier::<B>::new(&config, device)
        .load_file(weights_path, &CompactRecorder::new(), device)
        .map_err(|e| ClassifierError::Model(format!("failed to load {:?}: {:?}", weights_path, e)))?;

    let outputs = probe_output_dim(&model, device);
    if outputs != num_classes {
        return Err(ClassifierError::LabelMismatch {
            labels: num_classes,
            outputs,
        });
    }

    info!("Loaded model from {:?} ({} classes)", weights_path, outputs);
    Ok(model)
}

/// Run a blank image through the model and report its output width
pub fn probe_output_dim<B: Backend>(model: &RefundClassifier<B>, device: &B::Device) -> usize {
    let input = Tensor::<B, 4>::zeros([1, 3, IMAGE_SIZE, IMAGE_SIZE], device);
    let [_, outputs] = model.forward(input).dims();
    outputs
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    /// Write `<stem>.mpk` and `<stem>.json` for a model
    pub(crate) fn save_artifact<B: Backend>(model: RefundClassifier<B>, config: &RefundClassifierConfig, stem: &Path) {
        config.save(stem.with_extension("json")).unwrap();
        model.save_file(stem.to_path_buf(), &CompactRecorder::new()).unwrap();
    }

    type TestBackend = NdArray;

    fn small_config(num_classes: usize) -> RefundClassifierConfig {
        RefundClassifierConfig::new(num_classes)
            .with_base_filters(4)
            .with_hidden_units(8)
    }

    #[test]
    fn test_missing_artifact_is_fatal() {
        let device = Default::default();
        let result = load_classifier::<TestBackend>(Path::new("/nonexistent/model.mpk"), None, 3, &device);
        assert!(matches!(result, Err(ClassifierError::ModelNotFound(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("model");
        let device = Default::default();
        let config = small_config(4);

        save_artifact(config.init::<TestBackend>(&device), &config, &stem);

        let weights = stem.with_extension("mpk");
        let config_path = stem.with_extension("json");
        assert!(weights.exists());

        let model = load_classifier::<TestBackend>(&weights, Some(&config_path), 4, &device).unwrap();
        assert_eq!(model.num_classes(), 4);
    }

    #[test]
    fn test_label_count_must_match_model() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("model");
        let device = Default::default();
        let config = small_config(4);
        save_artifact(config.init::<TestBackend>(&device), &config, &stem);

        let result = load_classifier::<TestBackend>(
            &stem.with_extension("mpk"),
            Some(&stem.with_extension("json")),
            6,
            &device,
        );
        assert!(matches!(
            result,
            Err(ClassifierError::LabelMismatch { labels: 6, outputs: 4 })
        ));
    }

    #[test]
    fn test_corrupt_artifact_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let weights = dir.path().join("model.mpk");
        std::fs::write(&weights, b"definitely not a burn record").unwrap();
        let device = Default::default();

        let result = load_classifier::<TestBackend>(&weights, None, 3, &device);
        assert!(matches!(result, Err(ClassifierError::Model(_))));
    }

    #[test]
    fn test_default_config_follows_labels() {
        let config = resolve_config(None, 7).unwrap();
        assert_eq!(config.num_classes, 7);
    }
}
