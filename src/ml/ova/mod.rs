//! One-versus-all ensemble of calibrated averaged perceptrons.
//!
//! One binary learner is trained per class against all others. Each learner's
//! margin is mapped to a probability by its own Platt calibrator and the
//! per-class probabilities are normalized, so the most confident binary vote
//! ranks first.

mod calibration;
mod perceptron;

pub use calibration::PlattCalibrator;
pub use perceptron::{AveragedPerceptron, train_averaged_perceptron};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::dataset::TrainDataset;
use super::features::SparseVector;

/// Training options for the one-versus-all ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OvaOptions {
    /// Passes over the data per binary learner.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
}

fn default_iterations() -> usize {
    10
}

fn default_learning_rate() -> f32 {
    1.0
}

impl Default for OvaOptions {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            learning_rate: default_learning_rate(),
        }
    }
}

/// A perceptron and the calibrator fitted on its training margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryLearner {
    pub perceptron: AveragedPerceptron,
    pub calibrator: PlattCalibrator,
}

/// One-versus-all scoring head; `learners[k]` votes for class `k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvaModel {
    pub dim: usize,
    pub learners: Vec<BinaryLearner>,
}

impl OvaModel {
    pub fn n_classes(&self) -> usize {
        self.learners.len()
    }

    /// Validate the model dimensions.
    pub fn validate(&self) -> Result<(), String> {
        if self.learners.is_empty() {
            return Err("No binary learners defined".to_string());
        }
        for (idx, learner) in self.learners.iter().enumerate() {
            if learner.perceptron.weights.len() != self.dim {
                return Err(format!("learner {idx} weights length mismatch"));
            }
            let cal = learner.calibrator;
            if !cal.slope.is_finite() || !cal.offset.is_finite() {
                return Err(format!("learner {idx} has a non-finite calibrator"));
            }
        }
        Ok(())
    }

    /// Normalized per-class probabilities.
    pub fn predict_proba(&self, features: &SparseVector) -> Vec<f32> {
        let raw: Vec<f32> = self
            .learners
            .iter()
            .map(|learner| {
                learner
                    .calibrator
                    .probability(learner.perceptron.margin(features))
            })
            .collect();
        let sum: f32 = raw.iter().sum();
        if sum <= 0.0 || !sum.is_finite() {
            return vec![1.0 / raw.len().max(1) as f32; raw.len()];
        }
        raw.into_iter().map(|p| p / sum).collect()
    }
}

/// Train one calibrated binary learner per class.
pub fn train_ova(dataset: &TrainDataset, options: &OvaOptions, seed: u64) -> Result<OvaModel, String> {
    dataset.validate()?;
    if options.iterations == 0 {
        return Err("iterations must be > 0".to_string());
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut learners = Vec::with_capacity(dataset.classes.len());
    for class_idx in 0..dataset.classes.len() {
        let targets: Vec<bool> = dataset.y.iter().map(|&y| y == class_idx).collect();
        let perceptron = train_averaged_perceptron(
            &dataset.x,
            &targets,
            dataset.dim,
            options.iterations,
            options.learning_rate,
            &mut rng,
        );
        let margins: Vec<f32> = dataset.x.iter().map(|x| perceptron.margin(x)).collect();
        let calibrator = PlattCalibrator::fit(&margins, &targets);
        learners.push(BinaryLearner {
            perceptron,
            calibrator,
        });
    }
    let model = OvaModel {
        dim: dataset.dim,
        learners,
    };
    model.validate()?;
    Ok(model)
}
