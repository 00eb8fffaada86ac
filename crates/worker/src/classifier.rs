// SPDX-License-Identifier: MIT

//! The classifier: a loaded model that turns a preprocessed sequence tensor
//! into a probability vector over a fixed label set.
//!
//! The model is treated purely as a capability record — load-from-path,
//! predict-over-tensor, fixed labels — so alternative implementations (a
//! different architecture, a different weight format) can be swapped in
//! without touching the session pipeline.

use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("failed to read weights file {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("weights file {path} has {actual} bytes, expected {expected} for {labels} labels over {feature_dim} features")]
    SizeMismatch { path: String, actual: usize, expected: usize, labels: usize, feature_dim: usize },
}

pub trait Classifier: Send + Sync {
    /// Run the loaded model over a `(sequence_length, feature_dim)` tensor
    /// and return a probability vector aligned with `labels()`.
    fn predict(&self, tensor: &Array2<f32>) -> Array1<f32>;

    /// The fixed, ordered label set this classifier reports probabilities for.
    fn labels(&self) -> &[String];
}

/// A mean-time-pooled linear classifier: the sequence tensor is averaged
/// across the time axis into one feature vector, then passed through a single
/// dense layer and a softmax.
///
/// Weight file layout: `feature_dim * num_labels` row-major f32 (LE) weights
/// followed by `num_labels` f32 (LE) biases.
#[derive(Debug)]
pub struct DenseSequenceClassifier {
    weights: Array2<f32>, // (num_labels, feature_dim)
    bias: Array1<f32>,
    labels: Vec<String>,
}

impl DenseSequenceClassifier {
    pub fn load(path: &Path, feature_dim: usize, labels: Vec<String>) -> Result<Self, ClassifierError> {
        let bytes = std::fs::read(path)
            .map_err(|e| ClassifierError::Io { path: path.display().to_string(), source: e })?;

        let num_labels = labels.len();
        let expected_floats = feature_dim * num_labels + num_labels;
        let expected_bytes = expected_floats * 4;
        if bytes.len() != expected_bytes {
            return Err(ClassifierError::SizeMismatch {
                path: path.display().to_string(),
                actual: bytes.len(),
                expected: expected_bytes,
                labels: num_labels,
                feature_dim,
            });
        }

        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = [chunk[0], chunk[1], chunk[2], chunk[3]];
                f32::from_le_bytes(arr)
            })
            .collect();

        let (weight_floats, bias_floats) = floats.split_at(feature_dim * num_labels);
        let weights = Array2::from_shape_vec((num_labels, feature_dim), weight_floats.to_vec())
            .map_err(|_| ClassifierError::SizeMismatch {
                path: path.display().to_string(),
                actual: bytes.len(),
                expected: expected_bytes,
                labels: num_labels,
                feature_dim,
            })?;
        let bias = Array1::from_vec(bias_floats.to_vec());

        Ok(Self { weights, bias, labels })
    }

    /// Build a classifier directly from in-memory weights, used by tests and
    /// by code that synthesizes a model rather than loading one from disk.
    pub fn from_parts(weights: Array2<f32>, bias: Array1<f32>, labels: Vec<String>) -> Self {
        Self { weights, bias, labels }
    }
}

impl Classifier for DenseSequenceClassifier {
    fn predict(&self, tensor: &Array2<f32>) -> Array1<f32> {
        let pooled = tensor.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(tensor.ncols()));
        let logits = self.weights.dot(&pooled) + &self.bias;
        softmax(&logits)
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

fn softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Array1<f32> = logits.mapv(|v| (v - max).exp());
    let sum: f32 = exp.sum();
    if sum == 0.0 {
        Array1::from_elem(logits.len(), 1.0 / logits.len() as f32)
    } else {
        exp / sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn predict_returns_a_probability_distribution() {
        let weights = array![[1.0, 0.0], [0.0, 1.0]];
        let bias = array![0.0, 0.0];
        let classifier =
            DenseSequenceClassifier::from_parts(weights, bias, vec!["a".into(), "b".into()]);
        let tensor = array![[1.0, 0.0], [1.0, 0.0]];
        let probs = classifier.predict(&tensor);
        assert_eq!(probs.len(), 2);
        assert!((probs.sum() - 1.0).abs() < 1e-6);
        assert!(probs[0] > probs[1]);
    }

    #[test]
    fn load_rejects_wrong_sized_weights_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.bin");
        std::fs::write(&path, vec![0u8; 3]).unwrap();
        let err = DenseSequenceClassifier::load(&path, 675, vec!["a".into()]).unwrap_err();
        assert!(matches!(err, ClassifierError::SizeMismatch { .. }));
    }

    #[test]
    fn load_round_trips_written_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.bin");

        let feature_dim = 2;
        let labels = vec!["a".to_string(), "b".to_string()];
        let mut bytes = Vec::new();
        for v in [1.0_f32, 0.0, 0.0, 1.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        for v in [0.0_f32, 0.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        std::fs::write(&path, &bytes).unwrap();

        let classifier = DenseSequenceClassifier::load(&path, feature_dim, labels).unwrap();
        let tensor = array![[1.0, 0.0]];
        let probs = classifier.predict(&tensor);
        assert!(probs[0] > probs[1]);
    }
}
