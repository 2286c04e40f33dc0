//! Shared error taxonomy.
//!
//! Each module owns its own error enum; `ErrorKind` is the coarse category
//! every one of them maps onto so callers can branch without matching on
//! module-specific variants.

use std::fmt;

/// Coarse category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Paths unset or unreachable, invalid config values.
    Configuration,
    /// No directories, no files, or an empty dataset.
    EmptyInput,
    /// A directory that must exist does not.
    DirectoryNotFound,
    /// The model knows fewer labels than the ranking needs.
    TooFewClasses,
    /// The model artifact is missing, corrupt or unreadable.
    Artifact,
    /// A training stage failed.
    Training,
    /// Plain filesystem failure outside the categories above.
    Io,
}

impl ErrorKind {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::EmptyInput => "empty_input",
            ErrorKind::DirectoryNotFound => "directory_not_found",
            ErrorKind::TooFewClasses => "too_few_classes",
            ErrorKind::Artifact => "artifact",
            ErrorKind::Training => "training",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_have_distinct_names() {
        let kinds = [
            ErrorKind::Configuration,
            ErrorKind::EmptyInput,
            ErrorKind::DirectoryNotFound,
            ErrorKind::TooFewClasses,
            ErrorKind::Artifact,
            ErrorKind::Training,
            ErrorKind::Io,
        ];
        let names: std::collections::HashSet<_> = kinds.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), kinds.len());
        assert_eq!(ErrorKind::EmptyInput.to_string(), "empty_input");
    }
}
