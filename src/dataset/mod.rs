//! Labeled and unlabeled filename records.
//!
//! Training data comes from sorted directories (one label per directory) and
//! is exchanged with the training pipeline as a `Label;FileName` text file.

mod builder;
mod delimited;

pub use builder::{LabelMode, UnsortedInputs, build_training_set};
pub use delimited::{DATASET_HEADER, FIELD_SEPARATOR, LINE_ENDING};

use std::path::PathBuf;

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors raised while assembling, writing or reading datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// No sorted directories were supplied.
    #[error("Empty list of sorted directories")]
    NoDirectories,
    /// Every supplied directory was absent or held no files.
    #[error("Sorted files are absent in all {directories} directories")]
    EmptyDataset { directories: usize },
    /// The directory holding unsorted files does not exist.
    #[error("Directory with unsorted files not found: {path}")]
    DirectoryNotFound { path: PathBuf },
    /// The unsorted directory exists but holds no files.
    #[error("Files not found in {path}")]
    NoFilesInDirectory { path: PathBuf },
    /// An explicit list of unsorted files was empty.
    #[error("No input files given")]
    NoInputFiles,
    /// Failed to enumerate a directory.
    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read a dataset file.
    #[error("Failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write a dataset file.
    #[error("Failed to write dataset {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The first line of a dataset file is not the expected header.
    #[error("Dataset {path} has header {found:?}, expected {DATASET_HEADER:?}")]
    BadHeader { path: PathBuf, found: String },
    /// A data line could not be split into label and filename.
    #[error("Dataset {path} line {line}: expected `label;filename`")]
    MalformedLine { path: PathBuf, line: usize },
    /// A dataset file parsed but contained no records.
    #[error("Dataset {path} contains no records")]
    EmptyFile { path: PathBuf },
    /// A training set was built from an empty record list.
    #[error("Training set has no records")]
    NoRecords,
    /// A training record has no label or an empty one.
    #[error("Training record {filename:?} has no label")]
    MissingLabel { filename: String },
    /// A record cannot be written without corrupting the file layout.
    #[error("Cannot store label {label:?} for file {filename:?}: separator or line break in field")]
    Unrepresentable { label: String, filename: String },
}

impl DatasetError {
    /// Coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatasetError::NoDirectories
            | DatasetError::EmptyDataset { .. }
            | DatasetError::NoFilesInDirectory { .. }
            | DatasetError::NoInputFiles
            | DatasetError::NoRecords
            | DatasetError::EmptyFile { .. } => ErrorKind::EmptyInput,
            DatasetError::DirectoryNotFound { .. } => ErrorKind::DirectoryNotFound,
            DatasetError::BadHeader { .. }
            | DatasetError::MalformedLine { .. }
            | DatasetError::MissingLabel { .. }
            | DatasetError::Unrepresentable { .. } => ErrorKind::Training,
            DatasetError::ReadDir { .. } | DatasetError::Read { .. } | DatasetError::Write { .. } => {
                ErrorKind::Io
            }
        }
    }
}

/// One training or inference example.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabeledRecord {
    /// Source directory label; `None` for files awaiting classification.
    pub label: Option<String>,
    /// Base filename, path stripped.
    pub filename: String,
}

impl LabeledRecord {
    /// Create a labeled training record.
    pub fn labeled(label: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            filename: filename.into(),
        }
    }

    /// Create an unlabeled record from a full path.
    pub fn unlabeled(path: &str) -> Self {
        Self {
            label: None,
            filename: base_name(path).to_string(),
        }
    }
}

/// Ordered, non-empty collection of labeled records.
///
/// Duplicate filenames under different labels are distinct records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSet {
    records: Vec<LabeledRecord>,
}

impl TrainingSet {
    /// Build a training set, rejecting empty input and unlabeled records.
    pub fn new(records: Vec<LabeledRecord>) -> Result<Self, DatasetError> {
        if records.is_empty() {
            return Err(DatasetError::NoRecords);
        }
        if let Some(record) = records
            .iter()
            .find(|record| record.label.as_deref().is_none_or(str::is_empty))
        {
            return Err(DatasetError::MissingLabel {
                filename: record.filename.clone(),
            });
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LabeledRecord] {
        &self.records
    }

    /// Iterate `(label, filename)` pairs in dataset order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.records.iter().map(|record| {
            (
                record.label.as_deref().unwrap_or_default(),
                record.filename.as_str(),
            )
        })
    }
}

/// Strip a path to its final component, accepting `/` and `\` separators.
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
