//! Learning engine: featurization, trainers, cross-validation and metrics.
//!
//! These are the building blocks the training pipeline composes; they work on
//! in-memory featurized rows and know nothing about files.

pub mod cross_validation;
pub mod dataset;
pub mod features;
pub mod labels;
pub mod maxent;
pub mod metrics;
pub mod ova;
pub mod strategy;

pub use dataset::TrainDataset;
pub use features::{FeaturizerOptions, SparseVector, TextFeaturizer};
pub use labels::LabelVocabulary;
pub use strategy::{ScoringHead, Strategy, Trainer};
