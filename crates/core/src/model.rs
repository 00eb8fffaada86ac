// SPDX-License-Identifier: MIT

//! The model descriptor: the immutable record resolved from object-store JSON
//! that parameterizes a worker's classifier.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters needed to load and run one trained classifier.
///
/// The `model_id` itself is not a field here: it is the descriptor's canonical
/// object-store path, held by whoever resolved it, not part of the resolved value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub sequence_length: usize,
    pub feature_dim: usize,
    pub labels: Vec<String>,
    pub weights_ref: String,
}

/// Shape of the descriptor JSON as stored in the object store, which names
/// fields differently (`input_shape`, `model_path`) than our internal type.
#[derive(Debug, Deserialize)]
struct RawModelDescriptor {
    input_shape: [usize; 2],
    labels: Vec<String>,
    model_path: String,
}

#[derive(Debug, Error)]
pub enum ModelDescriptorError {
    #[error("malformed model descriptor: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("model descriptor has zero sequence_length or feature_dim")]
    DegenerateShape,
    #[error("model descriptor has no labels")]
    NoLabels,
}

impl ModelDescriptor {
    /// Parse a descriptor from the raw bytes of an object-store JSON document.
    pub fn parse(bytes: &[u8]) -> Result<Self, ModelDescriptorError> {
        let raw: RawModelDescriptor = serde_json::from_slice(bytes)?;
        let [sequence_length, feature_dim] = raw.input_shape;
        if sequence_length == 0 || feature_dim == 0 {
            return Err(ModelDescriptorError::DegenerateShape);
        }
        if raw.labels.is_empty() {
            return Err(ModelDescriptorError::NoLabels);
        }
        Ok(Self { sequence_length, feature_dim, labels: raw.labels, weights_ref: raw.model_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_descriptor() {
        let json = br#"{
            "input_shape": [30, 675],
            "labels": ["None", "hello", "thanks"],
            "model_path": "models/alphabet/weights.bin"
        }"#;
        let desc = ModelDescriptor::parse(json).expect("parses");
        assert_eq!(desc.sequence_length, 30);
        assert_eq!(desc.feature_dim, 675);
        assert_eq!(desc.labels, vec!["None", "hello", "thanks"]);
        assert_eq!(desc.weights_ref, "models/alphabet/weights.bin");
    }

    #[test]
    fn rejects_zero_shape() {
        let json = br#"{"input_shape":[0,675],"labels":["a"],"model_path":"m"}"#;
        assert!(matches!(ModelDescriptor::parse(json), Err(ModelDescriptorError::DegenerateShape)));
    }

    #[test]
    fn rejects_empty_labels() {
        let json = br#"{"input_shape":[30,675],"labels":[],"model_path":"m"}"#;
        assert!(matches!(ModelDescriptor::parse(json), Err(ModelDescriptorError::NoLabels)));
    }
}
