//! Training pipeline: dataset file in, model artifact out.
//!
//! Stages run in a fixed order (load dataset, featurize, cross validate,
//! fit, persist). Featurized rows are computed once and shared by every
//! cross-validation fold and the final fit. Cross-validation is diagnostic
//! only; its failures are logged and training continues.

pub mod artifact;
mod builder;

pub use artifact::{ArtifactError, TrainedModel};
pub use builder::{BuildReport, BuildRequest, ModelBuilder, UnsortedSource};

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::dataset::{DatasetError, TrainingSet};
use crate::error::ErrorKind;
use crate::ml::cross_validation::{CrossValidationReport, DEFAULT_FOLDS, cross_validate};
use crate::ml::{FeaturizerOptions, LabelVocabulary, Strategy, TextFeaturizer, TrainDataset};

/// Named steps of a training run, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingStage {
    LoadDataset,
    Featurize,
    CrossValidate,
    Fit,
    Persist,
}

impl TrainingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingStage::LoadDataset => "load dataset",
            TrainingStage::Featurize => "featurize",
            TrainingStage::CrossValidate => "cross validate",
            TrainingStage::Fit => "fit",
            TrainingStage::Persist => "persist",
        }
    }
}

impl fmt::Display for TrainingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building datasets or training models.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("Training failed during {stage}: {message}")]
    Stage {
        stage: TrainingStage,
        message: String,
    },
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A dataset or artifact failure raised inside a named training stage.
    #[error("Training failed during {stage}: {source}")]
    AtStage {
        stage: TrainingStage,
        #[source]
        source: Box<TrainingError>,
    },
}

impl TrainingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrainingError::Dataset(err) => err.kind(),
            TrainingError::Stage { .. } => ErrorKind::Training,
            TrainingError::Artifact(err) => err.kind(),
            TrainingError::Config(err) => err.kind(),
            TrainingError::AtStage { source, .. } => source.kind(),
        }
    }

    /// Stage the failure was raised in, if it came from a training run.
    pub fn stage(&self) -> Option<TrainingStage> {
        match self {
            TrainingError::Stage { stage, .. } | TrainingError::AtStage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    fn failed(stage: TrainingStage, message: impl Into<String>) -> Self {
        TrainingError::Stage {
            stage,
            message: message.into(),
        }
    }

    fn at(stage: TrainingStage, source: impl Into<TrainingError>) -> Self {
        TrainingError::AtStage {
            stage,
            source: Box::new(source.into()),
        }
    }
}

/// Result of [`TrainingPipeline::train`].
#[derive(Debug)]
pub enum TrainOutcome {
    /// An artifact already existed and rebuild was not requested.
    Skipped { path: PathBuf },
    /// A model was fitted and written.
    Trained {
        model: TrainedModel,
        cross_validation: Option<CrossValidationReport>,
    },
}

impl TrainOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TrainOutcome::Skipped { .. })
    }

    pub fn model(&self) -> Option<&TrainedModel> {
        match self {
            TrainOutcome::Trained { model, .. } => Some(model),
            TrainOutcome::Skipped { .. } => None,
        }
    }

    pub fn cross_validation(&self) -> Option<&CrossValidationReport> {
        match self {
            TrainOutcome::Trained {
                cross_validation, ..
            } => cross_validation.as_ref(),
            TrainOutcome::Skipped { .. } => None,
        }
    }
}

/// Composes featurization with a trainer strategy and persists the result.
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    pub strategy: Strategy,
    pub featurizer: FeaturizerOptions,
    pub folds: usize,
    pub seed: u64,
    /// Retrain even when an artifact already exists.
    pub rebuild: bool,
}

impl Default for TrainingPipeline {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            featurizer: FeaturizerOptions::default(),
            folds: DEFAULT_FOLDS,
            seed: 1,
            rebuild: false,
        }
    }
}

impl TrainingPipeline {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn with_rebuild(mut self, rebuild: bool) -> Self {
        self.rebuild = rebuild;
        self
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_featurizer(mut self, featurizer: FeaturizerOptions) -> Self {
        self.featurizer = featurizer;
        self
    }

    /// Whether [`TrainingPipeline::train`] would skip for this artifact path.
    pub fn would_skip(&self, model_path: &Path) -> bool {
        !self.rebuild && model_path.exists()
    }

    /// Train from the dataset file at `dataset_path` and write the artifact.
    pub fn train(&self, dataset_path: &Path, model_path: &Path) -> Result<TrainOutcome, TrainingError> {
        if self.would_skip(model_path) {
            info!("Model {} exists, skipping training", model_path.display());
            return Ok(TrainOutcome::Skipped {
                path: model_path.to_path_buf(),
            });
        }
        let set = TrainingSet::read_from(dataset_path)
            .map_err(|err| TrainingError::at(TrainingStage::LoadDataset, err))?;
        info!(
            "Loaded {} records from {}",
            set.len(),
            dataset_path.display()
        );
        let (model, cross_validation) = self.fit(&set)?;
        model
            .save(model_path)
            .map_err(|err| TrainingError::at(TrainingStage::Persist, err))?;
        info!(
            "Saved {} model with {} labels to {}",
            model.strategy,
            model.n_classes(),
            model_path.display()
        );
        Ok(TrainOutcome::Trained {
            model,
            cross_validation,
        })
    }

    /// Featurize, cross-validate and fit without touching the filesystem.
    pub fn fit(
        &self,
        set: &TrainingSet,
    ) -> Result<(TrainedModel, Option<CrossValidationReport>), TrainingError> {
        let featurizer = TextFeaturizer::new(self.featurizer)
            .map_err(|err| TrainingError::failed(TrainingStage::Featurize, err))?;
        let dataset = featurize_set(set, &featurizer);
        info!(
            "Featurized {} rows into {} dimensions across {} labels",
            dataset.len(),
            dataset.dim,
            dataset.classes.len()
        );

        let trainer = self.strategy.trainer(self.seed);
        let cross_validation = match cross_validate(&dataset, self.folds, self.seed, trainer.as_ref()) {
            Ok(report) => {
                info!(
                    "Cross-validation ({} folds): micro={:.3} macro={:.3} log_loss={:.3} top3={:.3}",
                    report.folds.len(),
                    report.mean_micro_accuracy(),
                    report.mean_macro_accuracy(),
                    report.mean_log_loss(),
                    report.mean_top3_accuracy()
                );
                Some(report)
            }
            Err(err) => {
                warn!("Skipping {}: {err}", TrainingStage::CrossValidate);
                None
            }
        };

        info!("Fitting {} on {} rows", trainer.name(), dataset.len());
        let head = trainer
            .fit(&dataset)
            .map_err(|err| TrainingError::failed(TrainingStage::Fit, err))?;
        let model = TrainedModel::new(self.strategy, self.featurizer, dataset.classes, head);
        model
            .validate()
            .map_err(|err| TrainingError::failed(TrainingStage::Fit, err))?;
        Ok((model, cross_validation))
    }
}

/// Map labels to keys and featurize every filename once.
fn featurize_set(set: &TrainingSet, featurizer: &TextFeaturizer) -> TrainDataset {
    let vocab = LabelVocabulary::from_observed(set.pairs().map(|(label, _)| label));
    let mut x = Vec::with_capacity(set.len());
    let mut y = Vec::with_capacity(set.len());
    for (label, filename) in set.pairs() {
        x.push(featurizer.featurize(filename));
        y.push(vocab.key(label).unwrap_or_default());
    }
    TrainDataset {
        classes: vocab.labels().to_vec(),
        dim: featurizer.dim(),
        x,
        y,
    }
}
