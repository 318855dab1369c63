//! Class label set
//!
//! The labels come from a static JSON mapping such as
//! `{"bag": 0, "shirt": 1, "shoe": 2}`. Keys, in file order, form the label
//! sequence; position `i` names output `i` of the model.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::utils::error::{ClassifierError, Result};

/// Ordered class names, indexed by model output position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    /// Build a label set from names in output order
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ClassifierError::Labels(
                "label set must contain at least one class".to_string(),
            ));
        }
        Ok(Self { names })
    }

    /// Parse a JSON object whose keys are the labels
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mapping: Map<String, Value> = serde_json::from_str(json).map_err(|e| {
            ClassifierError::Labels(format!("class mapping must be a JSON object: {}", e))
        })?;

        for (position, (name, value)) in mapping.iter().enumerate() {
            if let Some(index) = value.as_u64() {
                if index != position as u64 {
                    warn!(
                        "Class '{}' maps to {} but sits at position {}; file order wins",
                        name, index, position
                    );
                }
            }
        }

        Self::from_names(mapping.into_iter().map(|(name, _)| name))
    }

    /// Load the mapping file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ClassifierError::Labels(format!("failed to read {:?}: {}", path, e))
        })?;
        let labels = Self::from_json_str(&json)?;
        info!("Loaded {} class labels from {:?}", labels.len(), path);
        Ok(labels)
    }

    /// Get the class name for a given output index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Get the output index for a given class name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Check whether a name belongs to the label set
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a constructed label set
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over the names in output order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
