use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{DatasetError, LabeledRecord, TrainingSet, base_name};

/// How a sorted directory is turned into a label string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMode {
    /// The directory string exactly as supplied.
    #[default]
    FullPath,
    /// Only the final path component of the directory.
    LeafName,
}

impl LabelMode {
    fn label_for(self, directory: &Path) -> String {
        match self {
            LabelMode::FullPath => directory.to_string_lossy().into_owned(),
            LabelMode::LeafName => directory
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| directory.to_string_lossy().into_owned()),
        }
    }
}

/// Build a training set from directories of already-sorted files.
///
/// Each directory contributes one record per immediate file, labeled per
/// `label_mode`. Missing directories are skipped; the call fails only when
/// no directories are given or none of them yields a file.
pub fn build_training_set<P: AsRef<Path>>(
    directories: &[P],
    label_mode: LabelMode,
) -> Result<TrainingSet, DatasetError> {
    if directories.is_empty() {
        return Err(DatasetError::NoDirectories);
    }
    let mut records = Vec::new();
    for directory in directories {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            tracing::debug!("Skipping missing sorted directory {}", directory.display());
            continue;
        }
        let label = label_mode.label_for(directory);
        let files = list_file_names(directory)?;
        tracing::debug!("{} files under label {label:?}", files.len());
        records.extend(
            files
                .into_iter()
                .map(|filename| LabeledRecord::labeled(label.clone(), filename)),
        );
    }
    if records.is_empty() {
        return Err(DatasetError::EmptyDataset {
            directories: directories.len(),
        });
    }
    TrainingSet::new(records)
}

/// Unlabeled files waiting to be classified, unique by filename.
#[derive(Debug, Clone, Default)]
pub struct UnsortedInputs {
    records: Vec<LabeledRecord>,
    seen: HashSet<String>,
}

impl UnsortedInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every file directly inside `directory`.
    pub fn extend_from_dir(&mut self, directory: &Path) -> Result<usize, DatasetError> {
        if !directory.is_dir() {
            return Err(DatasetError::DirectoryNotFound {
                path: directory.to_path_buf(),
            });
        }
        let files = list_file_names(directory)?;
        if files.is_empty() {
            return Err(DatasetError::NoFilesInDirectory {
                path: directory.to_path_buf(),
            });
        }
        Ok(files.iter().filter(|name| self.insert(name)).count())
    }

    /// Add files given as full paths; only their base names are kept.
    pub fn extend_from_paths<S: AsRef<str>>(&mut self, paths: &[S]) -> Result<usize, DatasetError> {
        if paths.is_empty() {
            return Err(DatasetError::NoInputFiles);
        }
        Ok(paths
            .iter()
            .filter(|path| self.insert(base_name(path.as_ref())))
            .count())
    }

    fn insert(&mut self, filename: &str) -> bool {
        if !self.seen.insert(filename.to_string()) {
            return false;
        }
        self.records.push(LabeledRecord {
            label: None,
            filename: filename.to_string(),
        });
        true
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

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.filename.as_str())
    }
}

/// Names of the regular files directly inside `directory`, sorted.
fn list_file_names(directory: &Path) -> Result<Vec<String>, DatasetError> {
    let read_err = |source| DatasetError::ReadDir {
        path: directory.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in fs::read_dir(directory).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path: PathBuf = entry.path();
        if path.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    fn touch(dir: &Path, names: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for name in names {
            fs::write(dir.join(name), b"x").unwrap();
        }
    }

    #[test]
    fn one_record_per_file_labeled_with_directory_string() {
        let root = tempdir().unwrap();
        let a = root.path().join("A");
        let b = root.path().join("B");
        touch(&a, &["apple.txt", "avocado.txt"]);
        touch(&b, &["banana.txt"]);
        fs::create_dir_all(a.join("nested")).unwrap();

        let set = build_training_set(&[&a, &b], LabelMode::FullPath).unwrap();
        assert_eq!(set.len(), 3);
        let a_label = a.to_string_lossy().into_owned();
        let b_label = b.to_string_lossy().into_owned();
        let pairs: Vec<_> = set.pairs().collect();
        assert_eq!(
            pairs,
            vec![
                (a_label.as_str(), "apple.txt"),
                (a_label.as_str(), "avocado.txt"),
                (b_label.as_str(), "banana.txt"),
            ]
        );
    }

    #[test]
    fn leaf_mode_uses_last_component() {
        let root = tempdir().unwrap();
        let docs = root.path().join("docs");
        touch(&docs, &["report.doc"]);
        let set = build_training_set(&[&docs], LabelMode::LeafName).unwrap();
        assert_eq!(set.pairs().next(), Some(("docs", "report.doc")));
    }

    #[test]
    fn missing_directories_are_skipped() {
        let root = tempdir().unwrap();
        let present = root.path().join("present");
        touch(&present, &["one.txt"]);
        let missing = root.path().join("missing");
        let set = build_training_set(&[&missing, &present], LabelMode::FullPath).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn empty_inputs_fail_with_empty_input_kind() {
        let none: [&Path; 0] = [];
        let err = build_training_set(&none, LabelMode::FullPath).unwrap_err();
        assert!(matches!(err, DatasetError::NoDirectories));
        assert_eq!(err.kind(), ErrorKind::EmptyInput);

        let root = tempdir().unwrap();
        let empty = root.path().join("empty");
        fs::create_dir_all(&empty).unwrap();
        let missing = root.path().join("missing");
        let err = build_training_set(&[&empty, &missing], LabelMode::FullPath).unwrap_err();
        assert!(matches!(err, DatasetError::EmptyDataset { directories: 2 }));
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
    }

    #[test]
    fn unsorted_directory_errors() {
        let root = tempdir().unwrap();
        let mut inputs = UnsortedInputs::new();
        let err = inputs.extend_from_dir(&root.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirectoryNotFound);

        let err = inputs.extend_from_dir(root.path()).unwrap_err();
        assert!(matches!(err, DatasetError::NoFilesInDirectory { .. }));
    }

    #[test]
    fn unsorted_inputs_deduplicate_by_filename() {
        let root = tempdir().unwrap();
        touch(root.path(), &["a.txt", "b.txt"]);
        let mut inputs = UnsortedInputs::new();
        assert_eq!(inputs.extend_from_dir(root.path()).unwrap(), 2);
        let added = inputs
            .extend_from_paths(&[r"C:\elsewhere\a.txt", "/tmp/c.txt", "/tmp/c.txt"])
            .unwrap();
        assert_eq!(added, 1);
        let names: Vec<_> = inputs.filenames().collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
        assert!(inputs.records().iter().all(|r| r.label.is_none()));

        let empty: [&str; 0] = [];
        assert!(matches!(
            inputs.extend_from_paths(&empty),
            Err(DatasetError::NoInputFiles)
        ));
    }
}
