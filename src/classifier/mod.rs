//! Scoring of new filenames against a trained model.
//!
//! A [`Sorter`] is immutable once loaded and can be shared across threads;
//! every prediction method takes `&self`.

pub mod ranking;

pub use ranking::{
    DEFAULT_CONFIDENCE_THRESHOLD, LabelScore, NONE_LABEL, RankedPrediction, TOP_K,
    normalize_threshold, rank, top_k,
};

use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::dataset::base_name;
use crate::error::ErrorKind;
use crate::ml::TextFeaturizer;
use crate::pipeline::{ArtifactError, TrainedModel};

/// Errors raised while loading a model or classifying files.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Model knows {found} labels but ranking needs {required}")]
    TooFewClasses { found: usize, required: usize },
    #[error("No files to classify")]
    EmptyInput,
    #[error("Model is inconsistent: {message}")]
    InvalidModel { message: String },
}

impl ClassifierError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifierError::Artifact(err) => err.kind(),
            ClassifierError::TooFewClasses { .. } => ErrorKind::TooFewClasses,
            ClassifierError::EmptyInput => ErrorKind::EmptyInput,
            ClassifierError::InvalidModel { .. } => ErrorKind::Artifact,
        }
    }
}

/// Batch classification result for one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortedFile {
    pub filename: String,
    /// Assigned label or `"none"`.
    pub label: String,
}

/// Loaded model plus the featurizer it was trained with.
#[derive(Debug, Clone)]
pub struct Sorter {
    model: TrainedModel,
    featurizer: TextFeaturizer,
    threshold: f32,
}

impl Sorter {
    /// Load and validate the artifact at `model_path`.
    pub fn load(model_path: &Path) -> Result<Self, ClassifierError> {
        let model = TrainedModel::load(model_path)?;
        info!(
            "Loaded {} model with {} labels from {}",
            model.strategy,
            model.n_classes(),
            model_path.display()
        );
        Self::with_model(model).map_err(|message| {
            ClassifierError::Artifact(ArtifactError::Invalid {
                path: model_path.to_path_buf(),
                message,
            })
        })
    }

    /// Wrap an in-memory model.
    pub fn from_model(model: TrainedModel) -> Result<Self, ClassifierError> {
        Self::with_model(model).map_err(|message| ClassifierError::InvalidModel { message })
    }

    fn with_model(model: TrainedModel) -> Result<Self, String> {
        model.validate()?;
        let featurizer = TextFeaturizer::new(model.featurizer)?;
        Ok(Self {
            model,
            featurizer,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        })
    }

    /// Set the confidence threshold, clamped into `0..=1`.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = normalize_threshold(threshold);
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Schema labels; `scores()[i]` belongs to `labels()[i]`.
    pub fn labels(&self) -> &[String] {
        &self.model.labels
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// Raw score vector for the base name of `full_path`.
    pub fn scores(&self, full_path: &str) -> Vec<f32> {
        let features = self.featurizer.featurize(base_name(full_path));
        self.model.head.predict_proba(&features)
    }

    /// Top three labels for one file; the caller applies the threshold.
    pub fn predict_one(&self, full_path: &str) -> Result<RankedPrediction, ClassifierError> {
        rank(&self.scores(full_path), self.labels(), TOP_K)
    }

    /// Classify every path in order, assigning `"none"` below the threshold.
    pub fn predict_all<S: AsRef<str>>(&self, full_paths: &[S]) -> Result<Vec<SortedFile>, ClassifierError> {
        if full_paths.is_empty() {
            return Err(ClassifierError::EmptyInput);
        }
        let k = TOP_K.min(self.labels().len());
        full_paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let ranked = rank(&self.scores(path), self.labels(), k)?;
                Ok(SortedFile {
                    filename: base_name(path).to_string(),
                    label: ranked.assigned_label(self.threshold).to_string(),
                })
            })
            .collect()
    }
}
