//! Inference Predictor Module
//!
//! Runs the forward pass for one image and turns logits into a label and a
//! confidence.

use std::path::Path;
use std::time::{Duration, Instant};

use burn::tensor::{backend::Backend, Tensor};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::preprocess::preprocess;
use crate::labels::ClassLabels;
use crate::model::{load_classifier, RefundClassifier};
use crate::utils::error::{ClassifierError, Result};
use crate::utils::format_percent;

/// Number of ranked classes kept on a prediction
pub const TOP_K: usize = 5;

/// Numerically stable softmax
///
/// The max logit is subtracted before exponentiation so large logits do not
/// overflow. Returns an empty vector for empty input.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f64> = logits.iter().map(|&x| f64::from(x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| (e / sum) as f32).collect()
}

/// Index of the largest value; the first one wins on ties
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// One ranked class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub class_index: usize,
    pub label: String,
    pub probability: f32,
}

/// Result of a single prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class index
    pub class_index: usize,

    /// Predicted class name
    pub label: String,

    /// Probability of the predicted class, in [0, 1]
    pub confidence: f32,

    /// Full probability distribution over all classes
    pub probabilities: Vec<f32>,

    /// Highest-probability classes, best first
    pub top_k: Vec<ClassScore>,

    /// Forward pass time in milliseconds
    pub inference_time_ms: f64,
}

impl Prediction {
    /// Build a prediction from raw logits
    pub fn from_logits(logits: &[f32], labels: &ClassLabels, inference_time: Duration) -> Result<Self> {
        if logits.is_empty() {
            return Err(ClassifierError::Inference("model returned no logits".to_string()));
        }
        if let Some(bad) = logits.iter().find(|x| !x.is_finite()) {
            return Err(ClassifierError::Inference(format!("non-finite logit {}", bad)));
        }
        if logits.len() != labels.len() {
            return Err(ClassifierError::LabelMismatch {
                labels: labels.len(),
                outputs: logits.len(),
            });
        }

        let probabilities = softmax(logits);
        let class_index = argmax(&probabilities)
            .ok_or_else(|| ClassifierError::Inference("empty probability vector".to_string()))?;
        let label = labels
            .get(class_index)
            .ok_or_else(|| ClassifierError::Inference(format!("class index {} out of range", class_index)))?
            .to_string();

        let mut ranked: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        let top_k = ranked
            .into_iter()
            .take(TOP_K)
            .filter_map(|(idx, probability)| {
                labels.get(idx).map(|name| ClassScore {
                    class_index: idx,
                    label: name.to_string(),
                    probability,
                })
            })
            .collect();

        Ok(Self {
            class_index,
            label,
            confidence: probabilities[class_index],
            probabilities,
            top_k,
            inference_time_ms: inference_time.as_secs_f64() * 1000.0,
        })
    }

    /// Pretty print the prediction
    pub fn display(&self) -> String {
        let mut output = format!(
            "Prediction: {} (class {})\nConfidence: {}\nInference time: {:.2} ms\n",
            self.label,
            self.class_index,
            format_percent(self.confidence),
            self.inference_time_ms
        );

        output.push_str(&format!("\nTop-{} predictions:\n", self.top_k.len()));
        for (rank, score) in self.top_k.iter().enumerate() {
            output.push_str(&format!(
                "  {}. {} (class {}) - {}\n",
                rank + 1,
                score.label,
                score.class_index,
                format_percent(score.probability)
            ));
        }

        output
    }
}

/// Predictor holding one loaded model and its label set
pub struct Predictor<B: Backend> {
    model: RefundClassifier<B>,
    labels: ClassLabels,
    device: B::Device,
}

impl<B: Backend> Predictor<B> {
    /// Wrap an already built model
    pub fn new(model: RefundClassifier<B>, labels: ClassLabels, device: B::Device) -> Result<Self> {
        if model.num_classes() != labels.len() {
            return Err(ClassifierError::LabelMismatch {
                labels: labels.len(),
                outputs: model.num_classes(),
            });
        }
        Ok(Self { model, labels, device })
    }

    /// Load the model artifact and build a predictor on `device`
    pub fn load(
        weights_path: &Path,
        config_path: Option<&Path>,
        labels: ClassLabels,
        device: B::Device,
    ) -> Result<Self> {
        let model = load_classifier::<B>(weights_path, config_path, labels.len(), &device)?;
        Self::new(model, labels, device)
    }

    /// The label set predictions are drawn from
    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    /// Preprocess and classify a decoded image
    pub fn predict_image(&self, image: &DynamicImage) -> Result<Prediction> {
        let input = preprocess::<B>(image, &self.device);
        self.predict_tensor(input)
    }

    /// Classify a preprocessed `[1, 3, H, W]` tensor
    pub fn predict_tensor(&self, input: Tensor<B, 4>) -> Result<Prediction> {
        let start = Instant::now();
        let logits = self.model.forward(input);
        let logits: Vec<f32> = logits
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("failed to read logits: {:?}", e)))?;
        let inference_time = start.elapsed();

        Prediction::from_logits(&logits, &self.labels, inference_time)
    }

    /// Load an image from disk and classify it
    pub fn predict_file(&self, path: &Path) -> Result<Prediction> {
        let image = image::open(path).map_err(|e| ClassifierError::Decode(format!("{:?}: {}", path, e)))?;
        self.predict_image(&image)
    }
}
