//! Evaluation metrics for multiclass classifiers.

#[derive(Debug, Clone)]
/// Confusion matrix for a `K`-class classifier.
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }
}

#[derive(Debug, Clone)]
/// Precision/recall statistics for a single class.
pub struct PerClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f32,
    /// `TP / (TP + FN)`.
    pub recall: f32,
    /// Total number of true examples for the class.
    pub support: u32,
}

/// Compute per-class precision and recall from a confusion matrix.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    (0..k)
        .map(|class_idx| {
            let tp = cm.get(class_idx, class_idx) as f32;
            let support: u32 = (0..k).map(|j| cm.get(class_idx, j)).sum();
            let predicted: u32 = (0..k).map(|i| cm.get(i, class_idx)).sum();
            let fp = predicted as f32 - tp;
            let fn_ = support as f32 - tp;
            PerClassStats {
                precision: if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) },
                recall: if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) },
                support,
            }
        })
        .collect()
}

/// Fraction of all examples predicted correctly.
pub fn micro_accuracy(cm: &ConfusionMatrix) -> f32 {
    let total = cm.total();
    if total == 0 {
        return 0.0;
    }
    let correct: u64 = (0..cm.n_classes).map(|i| cm.get(i, i) as u64).sum();
    correct as f32 / total as f32
}

/// Mean recall over classes that have at least one true example.
pub fn macro_accuracy(cm: &ConfusionMatrix) -> f32 {
    let present: Vec<f32> = precision_recall_by_class(cm)
        .into_iter()
        .filter(|stats| stats.support > 0)
        .map(|stats| stats.recall)
        .collect();
    if present.is_empty() {
        0.0
    } else {
        present.iter().sum::<f32>() / present.len() as f32
    }
}

/// Negative log probability assigned to the true class, clamped away from 0.
pub fn log_loss_term(proba: &[f32], truth: usize) -> f32 {
    let p = proba.get(truth).copied().unwrap_or(0.0);
    -(p.max(1e-15) as f64).ln() as f32
}

/// Whether `target` is among the `k` highest scores.
pub fn top_k_contains(scores: &[f32], target: usize, k: usize) -> bool {
    let Some(&target_score) = scores.get(target) else {
        return false;
    };
    let ahead = scores
        .iter()
        .enumerate()
        .filter(|&(idx, &s)| s > target_score || (s == target_score && idx < target))
        .count();
    ahead < k
}
