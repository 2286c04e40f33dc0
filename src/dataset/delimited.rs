//! `Label;FileName` text serialization for training sets.

use std::fs;
use std::path::Path;

use super::{DatasetError, LabeledRecord, TrainingSet};

/// Header line of every dataset file.
pub const DATASET_HEADER: &str = "Label;FileName";
/// Field separator between label and filename.
pub const FIELD_SEPARATOR: char = ';';

/// Line terminator used when writing dataset files.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
/// Line terminator used when writing dataset files.
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

impl TrainingSet {
    /// Render the dataset as delimited text, header first.
    pub fn to_delimited_text(&self) -> Result<String, DatasetError> {
        let mut text = String::with_capacity(32 * (self.len() + 1));
        text.push_str(DATASET_HEADER);
        text.push_str(LINE_ENDING);
        for (label, filename) in self.pairs() {
            if label.contains(FIELD_SEPARATOR) || has_line_break(label) || has_line_break(filename)
            {
                return Err(DatasetError::Unrepresentable {
                    label: label.to_string(),
                    filename: filename.to_string(),
                });
            }
            text.push_str(label);
            text.push(FIELD_SEPARATOR);
            text.push_str(filename);
            text.push_str(LINE_ENDING);
        }
        Ok(text)
    }

    /// Write the dataset file, creating parent directories as needed.
    pub fn write_to(&self, path: &Path) -> Result<(), DatasetError> {
        let text = self.to_delimited_text()?;
        let write_err = |source| DatasetError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, text).map_err(write_err)
    }

    /// Read a dataset file written by [`TrainingSet::write_to`].
    pub fn read_from(path: &Path) -> Result<Self, DatasetError> {
        let text = fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_delimited_text(&text, path)
    }

    /// Parse delimited text; `path` is only used in error messages.
    pub fn parse_delimited_text(text: &str, path: &Path) -> Result<Self, DatasetError> {
        let mut lines = text.trim_start_matches('\u{feff}').lines().enumerate();
        let header = lines
            .by_ref()
            .find(|(_, line)| !line.trim().is_empty())
            .map(|(_, line)| line.trim())
            .unwrap_or_default();
        if header != DATASET_HEADER {
            return Err(DatasetError::BadHeader {
                path: path.to_path_buf(),
                found: header.to_string(),
            });
        }
        let mut records = Vec::new();
        for (idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let malformed = || DatasetError::MalformedLine {
                path: path.to_path_buf(),
                line: idx + 1,
            };
            let (label, filename) = line.split_once(FIELD_SEPARATOR).ok_or_else(malformed)?;
            if label.is_empty() || filename.is_empty() {
                return Err(malformed());
            }
            records.push(LabeledRecord::labeled(label, filename));
        }
        if records.is_empty() {
            return Err(DatasetError::EmptyFile {
                path: path.to_path_buf(),
            });
        }
        TrainingSet::new(records)
    }
}

fn has_line_break(field: &str) -> bool {
    field.contains(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_set() -> TrainingSet {
        TrainingSet::new(vec![
            LabeledRecord::labeled("/sorted/A", "apple.txt"),
            LabeledRecord::labeled("/sorted/B", "banana;split.txt"),
        ])
        .unwrap()
    }

    #[test]
    fn writes_header_and_one_line_per_record() {
        let text = sample_set().to_delimited_text().unwrap();
        let expected = format!(
            "Label;FileName{LINE_ENDING}/sorted/A;apple.txt{LINE_ENDING}/sorted/B;banana;split.txt{LINE_ENDING}"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn file_round_trips_and_creates_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Data").join("DataSet.csv");
        let set = sample_set();
        set.write_to(&path).unwrap();
        assert_eq!(TrainingSet::read_from(&path).unwrap(), set);
    }

    #[test]
    fn accepts_crlf_and_blank_lines() {
        let text = "Label;FileName\r\nA;a.txt\r\n\r\nB;b.txt\r\n";
        let set = TrainingSet::parse_delimited_text(text, Path::new("mem")).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.pairs().last(), Some(("B", "b.txt")));
    }

    #[test]
    fn rejects_bad_header_and_malformed_lines() {
        let err = TrainingSet::parse_delimited_text("Name;Label\nA;a\n", Path::new("mem"))
            .unwrap_err();
        assert!(matches!(err, DatasetError::BadHeader { .. }));

        let err = TrainingSet::parse_delimited_text("Label;FileName\nA;a\nnoseparator\n", Path::new("mem"))
            .unwrap_err();
        assert!(matches!(err, DatasetError::MalformedLine { line: 3, .. }));

        let err = TrainingSet::parse_delimited_text("Label;FileName\n", Path::new("mem"))
            .unwrap_err();
        assert!(matches!(err, DatasetError::EmptyFile { .. }));
    }

    #[test]
    fn refuses_labels_containing_separator() {
        let set = TrainingSet::new(vec![LabeledRecord::labeled("a;b", "x.txt")]).unwrap();
        assert!(matches!(
            set.to_delimited_text(),
            Err(DatasetError::Unrepresentable { .. })
        ));
    }
}
