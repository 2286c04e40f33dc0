//! Persisted settings for training and sorting.
//!
//! Settings live in `config.toml` inside the app root. A missing file yields
//! defaults. Relative model and dataset paths resolve against `data_root`,
//! which itself defaults to the app root.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs::{self, DATA_DIR_NAME};
use crate::classifier::{DEFAULT_CONFIDENCE_THRESHOLD, normalize_threshold};
use crate::dataset::LabelMode;
use crate::error::ErrorKind;
use crate::ml::cross_validation::DEFAULT_FOLDS;
use crate::ml::{FeaturizerOptions, Strategy};
use crate::pipeline::TrainingPipeline;

/// Default filename used to store the configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_MODEL_FILE: &str = "FilesSorterModel.zip";
pub const DEFAULT_DATASET_FILE: &str = "DataSet.csv";

/// Errors that may occur while loading, saving or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to create the config directory.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write a config file.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    /// No usable config directory found.
    #[error("No suitable config directory found")]
    NoConfigDir,
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::CreateDir { .. } | ConfigError::Read { .. } | ConfigError::Write { .. } => {
                ErrorKind::Io
            }
            ConfigError::ParseToml { .. }
            | ConfigError::SerializeToml { .. }
            | ConfigError::NoConfigDir => ErrorKind::Configuration,
        }
    }
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => ConfigError::CreateDir { path, source },
    }
}

/// Settings shared by the train and sort binaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SorterConfig {
    /// Base for relative paths; the app root when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_root: Option<PathBuf>,
    pub model_path: PathBuf,
    pub dataset_path: PathBuf,
    pub label_mode: LabelMode,
    /// Retrain even when the model artifact exists.
    pub rebuild_model: bool,
    /// Minimum top score for a label to be assigned; inclusive.
    pub confidence_threshold: f32,
    pub cross_validation_folds: usize,
    pub seed: u64,
    pub strategy: Strategy,
    pub featurizer: FeaturizerOptions,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            data_root: None,
            model_path: PathBuf::from(DATA_DIR_NAME).join(DEFAULT_MODEL_FILE),
            dataset_path: PathBuf::from(DATA_DIR_NAME).join(DEFAULT_DATASET_FILE),
            label_mode: LabelMode::default(),
            rebuild_model: false,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            cross_validation_folds: DEFAULT_FOLDS,
            seed: 1,
            strategy: Strategy::default(),
            featurizer: FeaturizerOptions::default(),
        }
    }
}

impl SorterConfig {
    /// Clamp values into their supported ranges.
    pub fn normalized(mut self) -> Self {
        self.confidence_threshold = normalize_threshold(self.confidence_threshold);
        self.cross_validation_folds = self.cross_validation_folds.max(2);
        if self.featurizer.validate().is_err() {
            self.featurizer = FeaturizerOptions::default();
        }
        self
    }

    /// Directory relative paths resolve against.
    pub fn resolved_data_root(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_root {
            Some(root) => Ok(root.clone()),
            None => app_dirs::app_root_dir().map_err(map_app_dir_error),
        }
    }

    /// Absolute location of the model artifact.
    pub fn resolved_model_path(&self) -> Result<PathBuf, ConfigError> {
        self.resolve(&self.model_path)
    }

    /// Absolute location of the dataset file.
    pub fn resolved_dataset_path(&self) -> Result<PathBuf, ConfigError> {
        self.resolve(&self.dataset_path)
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, ConfigError> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        Ok(self.resolved_data_root()?.join(path))
    }

    /// Training pipeline configured from these settings.
    pub fn pipeline(&self) -> TrainingPipeline {
        TrainingPipeline::new(self.strategy)
            .with_featurizer(self.featurizer)
            .with_folds(self.cross_validation_folds)
            .with_seed(self.seed)
            .with_rebuild(self.rebuild_model)
    }
}

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from the app root, returning defaults if missing.
pub fn load_or_default() -> Result<SorterConfig, ConfigError> {
    load_from(&config_path()?)
}

/// Load configuration from `path`, returning defaults if it does not exist.
pub fn load_from(path: &Path) -> Result<SorterConfig, ConfigError> {
    if !path.exists() {
        return Ok(SorterConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<SorterConfig>(&text)
        .map(SorterConfig::normalized)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
}

/// Persist configuration to the app root.
pub fn save(config: &SorterConfig) -> Result<(), ConfigError> {
    save_to_path(config, &config_path()?)
}

/// Write the TOML file atomically, creating parent directories as needed.
pub fn save_to_path(config: &SorterConfig, path: &Path) -> Result<(), ConfigError> {
    let data = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut temp = tempfile::Builder::new()
        .prefix(CONFIG_FILE_NAME)
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(write_err)?;
    temp.write_all(data.as_bytes()).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_dirs::ConfigBaseGuard;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, SorterConfig::default());
        assert_eq!(config.confidence_threshold, 0.3);
        assert_eq!(config.cross_validation_folds, 6);
        assert!(!config.rebuild_model);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg").join(CONFIG_FILE_NAME);
        let config = SorterConfig {
            data_root: Some(dir.path().to_path_buf()),
            label_mode: LabelMode::LeafName,
            rebuild_model: true,
            strategy: Strategy::from_id("maxent").unwrap(),
            ..SorterConfig::default()
        };
        save_to_path(&config, &path).unwrap();
        assert_eq!(load_from(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults_and_clamps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "confidence_threshold = 4.0\ncross_validation_folds = 0\n\n[strategy]\nkind = \"maximum_entropy\"\nepochs = 3\n",
        )
        .unwrap();
        let config = load_from(&path).unwrap();
        assert_eq!(config.confidence_threshold, 1.0);
        assert_eq!(config.cross_validation_folds, 2);
        assert_eq!(config.strategy.id(), "maxent");
        assert_eq!(config.model_path, SorterConfig::default().model_path);
    }

    #[test]
    fn invalid_toml_is_a_configuration_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "seed = \"not a number\"").unwrap();
        let err = load_from(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn relative_paths_resolve_against_data_root() {
        let dir = tempdir().unwrap();
        let config = SorterConfig {
            data_root: Some(dir.path().to_path_buf()),
            dataset_path: dir.path().join("elsewhere.csv"),
            ..SorterConfig::default()
        };
        assert_eq!(
            config.resolved_model_path().unwrap(),
            dir.path().join("Data").join(DEFAULT_MODEL_FILE)
        );
        assert_eq!(
            config.resolved_dataset_path().unwrap(),
            dir.path().join("elsewhere.csv")
        );
    }

    #[test]
    fn data_root_defaults_to_app_root() {
        let base = tempdir().unwrap();
        let _guard = ConfigBaseGuard::set(base.path().to_path_buf());
        let config = SorterConfig::default();
        let root = base.path().join(app_dirs::APP_DIR_NAME);
        assert_eq!(config.resolved_data_root().unwrap(), root);
        assert_eq!(config_path().unwrap(), root.join(CONFIG_FILE_NAME));
        save(&config).unwrap();
        assert_eq!(load_or_default().unwrap(), config);
    }
}
