//! Zip bundle holding a trained model and its schema.
//!
//! The archive carries two deflated JSON entries: `model.json` (format
//! version, strategy, featurizer options and scoring head) and `schema.json`
//! (ordered labels and input columns).

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::ml::{FeaturizerOptions, LabelVocabulary, ScoringHead, Strategy};

/// Current artifact format version.
pub const FORMAT_VERSION: u32 = 1;
pub const MODEL_ENTRY: &str = "model.json";
pub const SCHEMA_ENTRY: &str = "schema.json";
/// Input columns recorded in the schema entry.
pub const INPUT_COLUMNS: [&str; 2] = ["Label", "FileName"];

const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;

/// Errors raised while saving or loading a model artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Model artifact not found at {path}")]
    Missing { path: PathBuf },
    #[error("Failed to read model artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write model artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Model artifact {path} is not a valid bundle: {source}")]
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },
    #[error("Model artifact {path} entry {entry}: {source}")]
    Json {
        path: PathBuf,
        entry: &'static str,
        source: serde_json::Error,
    },
    #[error("Model artifact {path} is inconsistent: {message}")]
    Invalid { path: PathBuf, message: String },
}

impl ArtifactError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Artifact
    }
}

/// A fitted classifier with everything needed to score new filenames.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub format_version: u32,
    pub strategy: Strategy,
    pub featurizer: FeaturizerOptions,
    /// Label `i` is the label scored at position `i` of the head output.
    pub labels: Vec<String>,
    pub head: ScoringHead,
}

#[derive(Serialize, Deserialize)]
struct ModelEntry {
    format_version: u32,
    strategy: Strategy,
    featurizer: FeaturizerOptions,
    head: ScoringHead,
}

#[derive(Serialize, Deserialize)]
struct SchemaEntry {
    labels: Vec<String>,
    columns: Vec<String>,
}

impl TrainedModel {
    pub fn new(
        strategy: Strategy,
        featurizer: FeaturizerOptions,
        labels: Vec<String>,
        head: ScoringHead,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            strategy,
            featurizer,
            labels,
            head,
        }
    }

    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    /// Check that the head, schema and featurizer agree.
    pub fn validate(&self) -> Result<(), String> {
        if self.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                self.format_version
            ));
        }
        self.featurizer.validate()?;
        LabelVocabulary::from_schema(self.labels.clone())?;
        if self.labels.is_empty() {
            return Err("schema has no labels".to_string());
        }
        self.head.validate()?;
        if self.head.n_classes() != self.labels.len() {
            return Err(format!(
                "head scores {} classes but schema lists {} labels",
                self.head.n_classes(),
                self.labels.len()
            ));
        }
        if self.head.dim() != self.featurizer.dim() {
            return Err(format!(
                "head dimension {} does not match featurizer dimension {}",
                self.head.dim(),
                self.featurizer.dim()
            ));
        }
        Ok(())
    }

    /// Write the bundle atomically: a temp file in the target directory is
    /// filled and then renamed over `path`.
    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        let model = ModelEntry {
            format_version: self.format_version,
            strategy: self.strategy,
            featurizer: self.featurizer,
            head: self.head.clone(),
        };
        let schema = SchemaEntry {
            labels: self.labels.clone(),
            columns: INPUT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        };
        let model_bytes = serde_json::to_vec(&model).map_err(|source| ArtifactError::Json {
            path: path.to_path_buf(),
            entry: MODEL_ENTRY,
            source,
        })?;
        let schema_bytes =
            serde_json::to_vec_pretty(&schema).map_err(|source| ArtifactError::Json {
                path: path.to_path_buf(),
                entry: SCHEMA_ENTRY,
                source,
            })?;

        let write_err = |source| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(write_err)?;
        let mut temp = tempfile::Builder::new()
            .prefix("model_artifact")
            .tempfile_in(&dir)
            .map_err(write_err)?;
        {
            let zip_err = |source| ArtifactError::Zip {
                path: path.to_path_buf(),
                source,
            };
            let mut zip = zip::ZipWriter::new(temp.as_file_mut());
            // Fixed timestamps keep repeated saves of one model byte-identical.
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated)
                .last_modified_time(zip::DateTime::default());
            for (name, bytes) in [(MODEL_ENTRY, &model_bytes), (SCHEMA_ENTRY, &schema_bytes)] {
                zip.start_file(name, options).map_err(zip_err)?;
                zip.write_all(bytes).map_err(write_err)?;
            }
            zip.finish().map_err(zip_err)?;
        }
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(path).map_err(|err| write_err(err.error))?;
        Ok(())
    }

    /// Read and validate a bundle written by [`TrainedModel::save`].
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        if !path.is_file() {
            return Err(ArtifactError::Missing {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = zip::ZipArchive::new(file).map_err(|source| ArtifactError::Zip {
            path: path.to_path_buf(),
            source,
        })?;
        let model: ModelEntry = read_json_entry(&mut archive, path, MODEL_ENTRY)?;
        let schema: SchemaEntry = read_json_entry(&mut archive, path, SCHEMA_ENTRY)?;
        if schema.columns != INPUT_COLUMNS {
            return Err(ArtifactError::Invalid {
                path: path.to_path_buf(),
                message: format!("unexpected input columns {:?}", schema.columns),
            });
        }
        let trained = TrainedModel {
            format_version: model.format_version,
            strategy: model.strategy,
            featurizer: model.featurizer,
            labels: schema.labels,
            head: model.head,
        };
        trained.validate().map_err(|message| ArtifactError::Invalid {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(trained)
    }
}

fn read_json_entry<T: serde::de::DeserializeOwned>(
    archive: &mut zip::ZipArchive<File>,
    path: &Path,
    entry: &'static str,
) -> Result<T, ArtifactError> {
    let zip_file = archive.by_name(entry).map_err(|source| ArtifactError::Zip {
        path: path.to_path_buf(),
        source,
    })?;
    if zip_file.size() > MAX_ENTRY_BYTES {
        return Err(ArtifactError::Invalid {
            path: path.to_path_buf(),
            message: format!("entry {entry} is too large ({} bytes)", zip_file.size()),
        });
    }
    let mut bytes = Vec::with_capacity(zip_file.size() as usize);
    zip_file
        .take(MAX_ENTRY_BYTES)
        .read_to_end(&mut bytes)
        .map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        entry,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::maxent::MaxEntModel;
    use tempfile::tempdir;

    fn tiny_model() -> TrainedModel {
        let featurizer = FeaturizerOptions {
            hash_bits: 4,
            ..FeaturizerOptions::default()
        };
        let dim = featurizer.dim();
        let head = ScoringHead::MaximumEntropy(MaxEntModel {
            n_classes: 2,
            dim,
            weights: (0..2 * dim).map(|i| i as f32 * 0.01).collect(),
            bias: vec![0.1, -0.1],
        });
        TrainedModel::new(
            Strategy::from_id("maxent").unwrap(),
            featurizer,
            vec!["docs".into(), "music".into()],
            head,
        )
    }

    #[test]
    fn save_then_load_restores_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("model.zip");
        let model = tiny_model();
        model.save(&path).unwrap();
        let loaded = TrainedModel::load(&path).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn repeated_saves_are_byte_identical() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.zip");
        let second = dir.path().join("b.zip");
        tiny_model().save(&first).unwrap();
        tiny_model().save(&second).unwrap();
        assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
    }

    #[test]
    fn missing_and_corrupt_artifacts_fail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.zip");
        let err = TrainedModel::load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing { .. }));
        assert_eq!(err.kind(), ErrorKind::Artifact);

        std::fs::write(&path, b"not a zip").unwrap();
        assert!(matches!(
            TrainedModel::load(&path).unwrap_err(),
            ArtifactError::Zip { .. }
        ));
    }

    #[test]
    fn schema_mismatch_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.zip");
        let mut model = tiny_model();
        model.labels.push("extra".into());
        model.save(&path).unwrap();
        let err = TrainedModel::load(&path).unwrap_err();
        match err {
            ArtifactError::Invalid { message, .. } => assert!(message.contains("schema lists 3")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
