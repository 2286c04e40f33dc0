//! Stable categorical key encoding for label strings.

use std::collections::HashMap;

/// Ordered label vocabulary; key `i` maps to `labels()[i]`.
///
/// Keys are assigned in order of first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
    keys: HashMap<String, usize>,
}

impl LabelVocabulary {
    /// Build from labels in observation order; repeats keep their first key.
    pub fn from_observed<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut vocab = Self::default();
        for label in labels {
            vocab.intern(label);
        }
        vocab
    }

    /// Rebuild from a persisted schema, rejecting duplicates.
    pub fn from_schema(labels: Vec<String>) -> Result<Self, String> {
        let mut keys = HashMap::with_capacity(labels.len());
        for (idx, label) in labels.iter().enumerate() {
            if keys.insert(label.clone(), idx).is_some() {
                return Err(format!("Duplicate label {label:?} in schema"));
            }
        }
        Ok(Self { labels, keys })
    }

    fn intern(&mut self, label: &str) -> usize {
        if let Some(&key) = self.keys.get(label) {
            return key;
        }
        let key = self.labels.len();
        self.labels.push(label.to_string());
        self.keys.insert(label.to_string(), key);
        key
    }

    pub fn key(&self, label: &str) -> Option<usize> {
        self.keys.get(label).copied()
    }

    pub fn label(&self, key: usize) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_first_occurrence() {
        let vocab = LabelVocabulary::from_observed(["B", "A", "B", "C", "A"]);
        assert_eq!(vocab.labels(), &["B", "A", "C"]);
        assert_eq!(vocab.key("A"), Some(1));
        assert_eq!(vocab.label(2), Some("C"));
        assert_eq!(vocab.key("missing"), None);
    }

    #[test]
    fn schema_rejects_duplicates() {
        assert!(LabelVocabulary::from_schema(vec!["x".into(), "x".into()]).is_err());
        let vocab = LabelVocabulary::from_schema(vec!["x".into(), "y".into()]).unwrap();
        assert_eq!(vocab.key("y"), Some(1));
    }
}
