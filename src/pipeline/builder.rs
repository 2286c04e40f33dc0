use std::path::PathBuf;

use tracing::info;

use super::{TrainOutcome, TrainingError};
use crate::config::SorterConfig;
use crate::dataset::{UnsortedInputs, build_training_set};

/// Where files awaiting classification come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsortedSource {
    /// Every immediate file of a directory.
    Directory(PathBuf),
    /// An explicit list of paths.
    Files(Vec<String>),
}

/// Inputs for one end-to-end build.
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// One label per directory.
    pub sorted_dirs: Vec<PathBuf>,
    pub unsorted: Option<UnsortedSource>,
}

/// What a build produced.
#[derive(Debug)]
pub struct BuildReport {
    pub outcome: TrainOutcome,
    /// Files collected from the request's unsorted source.
    pub unsorted: UnsortedInputs,
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
}

/// Runs dataset assembly and training from a [`SorterConfig`].
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    config: SorterConfig,
}

impl ModelBuilder {
    pub fn new(config: SorterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SorterConfig {
        &self.config
    }

    /// Build the dataset file from the sorted directories and train a model.
    ///
    /// An existing artifact short-circuits the build unless the config asks
    /// for a rebuild. Unsorted inputs are validated before any dataset work
    /// so a bad directory fails fast.
    pub fn build(&self, request: &BuildRequest) -> Result<BuildReport, TrainingError> {
        let dataset_path = self.config.resolved_dataset_path()?;
        let model_path = self.config.resolved_model_path()?;
        let pipeline = self.config.pipeline();

        if pipeline.would_skip(&model_path) {
            info!("Model {} exists, skipping build", model_path.display());
            return Ok(BuildReport {
                outcome: TrainOutcome::Skipped {
                    path: model_path.clone(),
                },
                unsorted: UnsortedInputs::new(),
                dataset_path,
                model_path,
            });
        }

        let mut unsorted = UnsortedInputs::new();
        match &request.unsorted {
            Some(UnsortedSource::Directory(dir)) => {
                unsorted.extend_from_dir(dir)?;
            }
            Some(UnsortedSource::Files(paths)) => {
                unsorted.extend_from_paths(paths)?;
            }
            None => {}
        }
        if !unsorted.is_empty() {
            info!("Collected {} unsorted files", unsorted.len());
        }

        let set = build_training_set(&request.sorted_dirs, self.config.label_mode)?;
        set.write_to(&dataset_path)?;
        info!(
            "Wrote {} records from {} directories to {}",
            set.len(),
            request.sorted_dirs.len(),
            dataset_path.display()
        );

        let outcome = pipeline.train(&dataset_path, &model_path)?;
        Ok(BuildReport {
            outcome,
            unsorted,
            dataset_path,
            model_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::tempdir;

    fn config_in(root: &std::path::Path) -> SorterConfig {
        SorterConfig {
            data_root: Some(root.to_path_buf()),
            ..SorterConfig::default()
        }
    }

    #[test]
    fn missing_unsorted_directory_fails_before_dataset_is_written() {
        let root = tempdir().unwrap();
        let sorted = root.path().join("docs");
        fs::create_dir_all(&sorted).unwrap();
        fs::write(sorted.join("a.txt"), b"").unwrap();
        let builder = ModelBuilder::new(config_in(root.path()));
        let err = builder
            .build(&BuildRequest {
                sorted_dirs: vec![sorted],
                unsorted: Some(UnsortedSource::Directory(root.path().join("absent"))),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirectoryNotFound);
        assert!(!builder.config().resolved_dataset_path().unwrap().exists());
    }

    #[test]
    fn no_sorted_directories_is_empty_input() {
        let root = tempdir().unwrap();
        let err = ModelBuilder::new(config_in(root.path()))
            .build(&BuildRequest::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
    }

    #[test]
    fn builds_dataset_and_model() {
        let root = tempdir().unwrap();
        let mut dirs = Vec::new();
        for (label, names) in [
            ("docs", ["report.pdf", "invoice.pdf"]),
            ("music", ["song.mp3", "track.mp3"]),
        ] {
            let dir = root.path().join(label);
            fs::create_dir_all(&dir).unwrap();
            for name in names {
                fs::write(dir.join(name), b"").unwrap();
            }
            dirs.push(dir);
        }
        let report = ModelBuilder::new(config_in(root.path()))
            .build(&BuildRequest {
                sorted_dirs: dirs,
                unsorted: Some(UnsortedSource::Files(vec!["/tmp/new.mp3".into()])),
            })
            .unwrap();
        assert!(!report.outcome.is_skipped());
        assert!(report.dataset_path.is_file());
        assert!(report.model_path.is_file());
        assert_eq!(report.unsorted.filenames().collect::<Vec<_>>(), vec!["new.mp3"]);
    }
}
