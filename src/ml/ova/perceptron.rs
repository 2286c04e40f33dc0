use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::ml::features::SparseVector;

/// Linear binary classifier with averaged weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragedPerceptron {
    pub weights: Vec<f32>,
    pub bias: f32,
}

impl AveragedPerceptron {
    /// Signed distance-like score; positive means "in class".
    pub fn margin(&self, features: &SparseVector) -> f32 {
        self.bias + features.dot(&self.weights)
    }
}

/// Train one averaged perceptron on `targets` (true = positive class).
///
/// Updates happen on non-positive margins. The returned weights are the
/// average of the weight vector over every example visit, computed with the
/// lazy `w - u / c` formulation so each update touches only non-zero features.
pub fn train_averaged_perceptron(
    x: &[SparseVector],
    targets: &[bool],
    dim: usize,
    iterations: usize,
    learning_rate: f32,
    rng: &mut StdRng,
) -> AveragedPerceptron {
    let mut w = vec![0.0f32; dim];
    let mut b = 0.0f32;
    let mut u = vec![0.0f32; dim];
    let mut ub = 0.0f32;
    let mut counter = 1.0f32;
    let mut order: Vec<usize> = (0..x.len()).collect();

    for _ in 0..iterations {
        order.shuffle(rng);
        for &idx in &order {
            let sign = if targets[idx] { 1.0 } else { -1.0 };
            let margin = b + x[idx].dot(&w);
            if sign * margin <= 0.0 {
                let step = learning_rate * sign;
                x[idx].add_scaled_to(&mut w, step);
                x[idx].add_scaled_to(&mut u, counter * step);
                b += step;
                ub += counter * step;
            }
            counter += 1.0;
        }
    }

    let weights = w
        .iter()
        .zip(u.iter())
        .map(|(wi, ui)| wi - ui / counter)
        .collect();
    AveragedPerceptron {
        weights,
        bias: b - ub / counter,
    }
}
