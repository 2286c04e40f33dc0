use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::{MaxEntModel, softmax};
use crate::ml::dataset::TrainDataset;

/// Training options for the maximum entropy head.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaxEntOptions {
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default = "default_l2")]
    pub l2: f32,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_epochs() -> usize {
    30
}

fn default_learning_rate() -> f32 {
    0.5
}

fn default_l2() -> f32 {
    1e-4
}

fn default_batch_size() -> usize {
    32
}

impl Default for MaxEntOptions {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            learning_rate: default_learning_rate(),
            l2: default_l2(),
            batch_size: default_batch_size(),
        }
    }
}

/// Fit a softmax regression with mini-batch gradient descent and L2 decay.
pub fn train_maxent(
    dataset: &TrainDataset,
    options: &MaxEntOptions,
    seed: u64,
) -> Result<MaxEntModel, String> {
    dataset.validate()?;
    if !options.learning_rate.is_finite() || options.learning_rate <= 0.0 {
        return Err("learning_rate must be > 0".to_string());
    }
    let classes = dataset.classes.len();
    let dim = dataset.dim;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut weights = vec![0.0f32; classes * dim];
    let mut bias = vec![0.0f32; classes];
    for w in &mut weights {
        *w = (rng.random::<f32>() - 0.5) * 0.01;
    }

    let mut indices: Vec<usize> = (0..dataset.len()).collect();
    let batch_size = options.batch_size.max(1);
    let lr = options.learning_rate;
    let decay = 1.0 - lr * options.l2.max(0.0);
    if decay <= 0.0 {
        return Err("learning_rate * l2 must be < 1".to_string());
    }

    // Effective weights are `scale * weights`; L2 decay only shrinks `scale`,
    // so a batch touches just the feature indices present in its rows.
    let mut scale = 1.0f32;
    let mut diffs = vec![0.0f32; batch_size * classes];
    let mut grad_b = vec![0.0f32; classes];
    for _epoch in 0..options.epochs {
        indices.shuffle(&mut rng);
        for chunk in indices.chunks(batch_size) {
            grad_b.fill(0.0);
            for (row, &idx) in chunk.iter().enumerate() {
                let x = &dataset.x[idx];
                let y = dataset.y[idx];
                let logits: Vec<f32> = (0..classes)
                    .map(|c| bias[c] + scale * x.dot(&weights[c * dim..(c + 1) * dim]))
                    .collect();
                let probs = softmax(&logits);
                for c in 0..classes {
                    let diff = probs[c] - if c == y { 1.0 } else { 0.0 };
                    diffs[row * classes + c] = diff;
                    grad_b[c] += diff;
                }
            }
            let inv = 1.0 / chunk.len() as f32;
            scale *= decay;
            let step = lr * inv / scale;
            for (row, &idx) in chunk.iter().enumerate() {
                let x = &dataset.x[idx];
                for c in 0..classes {
                    let diff = diffs[row * classes + c];
                    x.add_scaled_to(&mut weights[c * dim..(c + 1) * dim], -step * diff);
                }
            }
            for (b, g) in bias.iter_mut().zip(grad_b.iter()) {
                *b -= lr * g * inv;
            }
            if scale < 1e-6 {
                fold_scale(&mut weights, &mut scale);
            }
        }
    }
    fold_scale(&mut weights, &mut scale);

    let model = MaxEntModel {
        n_classes: classes,
        dim,
        weights,
        bias,
    };
    model.validate()?;
    Ok(model)
}

fn fold_scale(weights: &mut [f32], scale: &mut f32) {
    if *scale != 1.0 {
        weights.iter_mut().for_each(|w| *w *= *scale);
        *scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::features::{FeaturizerOptions, TextFeaturizer};

    fn fruit_dataset() -> TrainDataset {
        let featurizer = TextFeaturizer::new(FeaturizerOptions::default()).unwrap();
        let rows = [
            ("apple.txt", 0),
            ("avocado.txt", 0),
            ("banana.txt", 1),
            ("blueberry.txt", 1),
            ("cherry.txt", 2),
            ("coconut.txt", 2),
        ];
        TrainDataset {
            classes: vec!["A".into(), "B".into(), "C".into()],
            dim: featurizer.dim(),
            x: rows.iter().map(|(name, _)| featurizer.featurize(name)).collect(),
            y: rows.iter().map(|(_, y)| *y).collect(),
        }
    }

    #[test]
    fn fits_training_rows() {
        let data = fruit_dataset();
        let model = train_maxent(&data, &MaxEntOptions::default(), 1).unwrap();
        for (x, &y) in data.x.iter().zip(data.y.iter()) {
            let proba = model.predict_proba(x);
            let best = proba
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap();
            assert_eq!(best, y);
        }
    }

    #[test]
    fn same_seed_same_model() {
        let data = fruit_dataset();
        let a = train_maxent(&data, &MaxEntOptions::default(), 7).unwrap();
        let b = train_maxent(&data, &MaxEntOptions::default(), 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn l2_decay_shrinks_unseen_weights() {
        let data = fruit_dataset();
        let options = MaxEntOptions {
            epochs: 5,
            l2: 0.1,
            ..MaxEntOptions::default()
        };
        let seen: std::collections::HashSet<usize> = data
            .x
            .iter()
            .flat_map(|x| x.iter().map(|(i, _)| i))
            .collect();
        let unseen = (0..data.dim).find(|i| !seen.contains(i)).unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let initial: Vec<f32> = (0..data.dim * 3)
            .map(|_| (rng.random::<f32>() - 0.5) * 0.01)
            .collect();
        let model = train_maxent(&data, &options, 3).unwrap();
        // 5 epochs of one batch each, decay factor 1 - 0.5 * 0.1 per batch.
        let expected = initial[unseen] * 0.95f32.powi(5);
        assert!((model.weights[unseen] - expected).abs() < 1e-6);
    }

    #[test]
    fn rejects_empty_dataset() {
        let mut data = fruit_dataset();
        data.x.clear();
        data.y.clear();
        assert!(train_maxent(&data, &MaxEntOptions::default(), 1).is_err());
    }
}
