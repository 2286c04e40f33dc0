//! Multinomial logistic regression (maximum entropy) over hashed filename features.

use serde::{Deserialize, Serialize};

use super::features::SparseVector;

mod train;
pub use train::{MaxEntOptions, train_maxent};

/// Softmax-regression scoring head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxEntModel {
    pub n_classes: usize,
    pub dim: usize,
    /// Row-major `[n_classes][dim]`.
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

impl MaxEntModel {
    /// Validate the model dimensions.
    pub fn validate(&self) -> Result<(), String> {
        if self.n_classes == 0 {
            return Err("No classes defined".to_string());
        }
        if self.weights.len() != self.n_classes * self.dim {
            return Err("weights length mismatch".to_string());
        }
        if self.bias.len() != self.n_classes {
            return Err("bias length mismatch".to_string());
        }
        if self.weights.iter().chain(self.bias.iter()).any(|w| !w.is_finite()) {
            return Err("non-finite parameter".to_string());
        }
        Ok(())
    }

    /// Raw per-class logits.
    pub fn logits(&self, features: &SparseVector) -> Vec<f32> {
        (0..self.n_classes)
            .map(|c| self.bias[c] + features.dot(self.class_weights(c)))
            .collect()
    }

    /// Class probabilities, summing to 1.
    pub fn predict_proba(&self, features: &SparseVector) -> Vec<f32> {
        softmax(&self.logits(features))
    }

    fn class_weights(&self, class: usize) -> &[f32] {
        &self.weights[class * self.dim..(class + 1) * self.dim]
    }
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return vec![1.0 / logits.len().max(1) as f32; logits.len()];
    }
    exp.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_model_is_uniform() {
        let model = MaxEntModel {
            n_classes: 4,
            dim: 8,
            weights: vec![0.0; 32],
            bias: vec![0.0; 4],
        };
        model.validate().unwrap();
        let proba = model.predict_proba(&SparseVector::from_sorted([(3, 1.0)]));
        assert!(proba.iter().all(|p| (p - 0.25).abs() < 1e-6));
    }

    #[test]
    fn softmax_handles_large_logits() {
        let p = softmax(&[1000.0, 0.0]);
        assert!((p[0] - 1.0).abs() < 1e-6);
        assert!(p[1] >= 0.0);
    }

    #[test]
    fn validate_rejects_shape_mismatch() {
        let model = MaxEntModel {
            n_classes: 2,
            dim: 3,
            weights: vec![0.0; 5],
            bias: vec![0.0; 2],
        };
        assert!(model.validate().is_err());
    }
}
