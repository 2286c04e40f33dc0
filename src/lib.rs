//! Sort files into categories learned from already-sorted example folders.
//!
//! Filenames are the only signal: each sorted directory is one label, its
//! files are the training examples, and new files are ranked against the
//! learned labels.

/// Application directory helpers.
pub mod app_dirs;
/// Scoring and top-3 ranking of new files.
pub mod classifier;
/// TOML-backed settings.
pub mod config;
/// Training records and the dataset file format.
pub mod dataset;
/// Shared error categories.
pub mod error;
/// Tracing subscriber setup.
pub mod logging;
/// Featurization, trainers and evaluation.
pub mod ml;
/// Dataset-to-artifact training pipeline.
pub mod pipeline;

pub use classifier::{RankedPrediction, SortedFile, Sorter};
pub use config::SorterConfig;
pub use dataset::{LabelMode, TrainingSet};
pub use error::ErrorKind;
pub use ml::Strategy;
pub use pipeline::{ModelBuilder, TrainOutcome, TrainingPipeline};
