//! k-fold cross-validation used for diagnostic metrics only.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::dataset::TrainDataset;
use super::metrics::{ConfusionMatrix, log_loss_term, macro_accuracy, micro_accuracy, top_k_contains};
use super::strategy::Trainer;

/// Default number of folds.
pub const DEFAULT_FOLDS: usize = 6;

/// Metrics for one held-out fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldMetrics {
    pub fold: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub micro_accuracy: f32,
    pub macro_accuracy: f32,
    pub log_loss: f32,
    pub top3_accuracy: f32,
}

/// Per-fold metrics of one cross-validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationReport {
    pub folds: Vec<FoldMetrics>,
}

impl CrossValidationReport {
    fn mean(&self, metric: impl Fn(&FoldMetrics) -> f32) -> f32 {
        if self.folds.is_empty() {
            return 0.0;
        }
        self.folds.iter().map(metric).sum::<f32>() / self.folds.len() as f32
    }

    pub fn mean_micro_accuracy(&self) -> f32 {
        self.mean(|f| f.micro_accuracy)
    }

    pub fn mean_macro_accuracy(&self) -> f32 {
        self.mean(|f| f.macro_accuracy)
    }

    pub fn mean_log_loss(&self) -> f32 {
        self.mean(|f| f.log_loss)
    }

    pub fn mean_top3_accuracy(&self) -> f32 {
        self.mean(|f| f.top3_accuracy)
    }
}

/// Assign each row to one of `folds` folds after a seeded shuffle.
pub fn fold_assignments(rows: usize, folds: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let mut assignment = vec![0usize; rows];
    for (position, &row) in order.iter().enumerate() {
        assignment[row] = position % folds.max(1);
    }
    assignment
}

/// Train on `k - 1` folds and evaluate on the remaining one, for every fold.
pub fn cross_validate(
    dataset: &TrainDataset,
    folds: usize,
    seed: u64,
    trainer: &dyn Trainer,
) -> Result<CrossValidationReport, String> {
    dataset.validate()?;
    if folds < 2 {
        return Err(format!("Cross-validation needs at least 2 folds, got {folds}"));
    }
    if dataset.len() < folds {
        return Err(format!(
            "Cross-validation needs at least {folds} rows, got {}",
            dataset.len()
        ));
    }
    let assignment = fold_assignments(dataset.len(), folds, seed);
    let mut report = CrossValidationReport { folds: Vec::with_capacity(folds) };
    for fold in 0..folds {
        let (test_idx, train_idx): (Vec<usize>, Vec<usize>) =
            (0..dataset.len()).partition(|&row| assignment[row] == fold);
        let train = dataset.subset(&train_idx);
        let test = dataset.subset(&test_idx);
        let head = trainer
            .fit(&train)
            .map_err(|err| format!("fold {fold}: {err}"))?;

        let mut cm = ConfusionMatrix::new(dataset.classes.len());
        let mut loss = 0.0f32;
        let mut top3_hits = 0usize;
        for (x, &truth) in test.x.iter().zip(test.y.iter()) {
            let proba = head.predict_proba(x);
            let predicted = proba
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1).then(b.0.cmp(&a.0)))
                .map(|(idx, _)| idx)
                .unwrap_or(0);
            cm.add(truth, predicted);
            loss += log_loss_term(&proba, truth);
            if top_k_contains(&proba, truth, 3) {
                top3_hits += 1;
            }
        }
        let n = test.len().max(1) as f32;
        let metrics = FoldMetrics {
            fold,
            train_rows: train.len(),
            test_rows: test.len(),
            micro_accuracy: micro_accuracy(&cm),
            macro_accuracy: macro_accuracy(&cm),
            log_loss: loss / n,
            top3_accuracy: top3_hits as f32 / n,
        };
        tracing::debug!(
            "fold {fold}: micro={:.3} macro={:.3} log_loss={:.3}",
            metrics.micro_accuracy,
            metrics.macro_accuracy,
            metrics.log_loss
        );
        report.folds.push(metrics);
    }
    Ok(report)
}
