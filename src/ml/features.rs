//! Hashed n-gram featurization of filenames.
//!
//! A filename is lower-cased and split into word unigrams/bigrams and
//! character trigrams. Each n-gram is hashed with blake3 into a fixed number
//! of buckets and the resulting counts are L2-normalized.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("word pattern is valid"));

const MIN_HASH_BITS: u8 = 4;
const MAX_HASH_BITS: u8 = 20;

/// Featurizer parameters baked into a trained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturizerOptions {
    /// Feature dimension is `2^hash_bits`.
    #[serde(default = "default_hash_bits")]
    pub hash_bits: u8,
    /// Longest word n-gram (1 = unigrams only, 0 = no word features).
    #[serde(default = "default_word_ngram")]
    pub word_ngram: usize,
    /// Character n-gram length (0 = no character features).
    #[serde(default = "default_char_ngram")]
    pub char_ngram: usize,
}

fn default_hash_bits() -> u8 {
    12
}

fn default_word_ngram() -> usize {
    2
}

fn default_char_ngram() -> usize {
    3
}

impl Default for FeaturizerOptions {
    fn default() -> Self {
        Self {
            hash_bits: default_hash_bits(),
            word_ngram: default_word_ngram(),
            char_ngram: default_char_ngram(),
        }
    }
}

impl FeaturizerOptions {
    /// Validate structural invariants.
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_HASH_BITS..=MAX_HASH_BITS).contains(&self.hash_bits) {
            return Err(format!(
                "hash_bits {} outside {MIN_HASH_BITS}..={MAX_HASH_BITS}",
                self.hash_bits
            ));
        }
        if self.word_ngram == 0 && self.char_ngram == 0 {
            return Err("word_ngram and char_ngram cannot both be 0".to_string());
        }
        Ok(())
    }

    /// Number of feature buckets.
    pub fn dim(&self) -> usize {
        1usize << self.hash_bits
    }
}

/// Sparse feature vector with strictly increasing indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseVector {
    /// Build from `(index, value)` pairs; indices must be strictly increasing.
    pub fn from_sorted(pairs: impl IntoIterator<Item = (u32, f32)>) -> Self {
        let (indices, values) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices
            .iter()
            .zip(self.values.iter())
            .map(|(&i, &v)| (i as usize, v))
    }

    /// Dot product with a dense row; out-of-range indices contribute nothing.
    pub fn dot(&self, dense: &[f32]) -> f32 {
        self.iter()
            .map(|(i, v)| dense.get(i).copied().unwrap_or(0.0) * v)
            .sum()
    }

    /// `dense += scale * self`.
    pub fn add_scaled_to(&self, dense: &mut [f32], scale: f32) {
        for (i, v) in self.iter() {
            if let Some(slot) = dense.get_mut(i) {
                *slot += scale * v;
            }
        }
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }
}

/// Turns filename strings into hashed sparse vectors.
#[derive(Debug, Clone)]
pub struct TextFeaturizer {
    options: FeaturizerOptions,
}

impl TextFeaturizer {
    pub fn new(options: FeaturizerOptions) -> Result<Self, String> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> FeaturizerOptions {
        self.options
    }

    pub fn dim(&self) -> usize {
        self.options.dim()
    }

    /// Featurize one filename.
    pub fn featurize(&self, text: &str) -> SparseVector {
        let lower = text.to_lowercase();
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        let mut bump = |kind: &[u8], gram: &str| {
            *counts.entry(self.bucket(kind, gram)).or_default() += 1.0;
        };

        if self.options.word_ngram > 0 {
            let words: Vec<&str> = WORD_PATTERN.find_iter(&lower).map(|m| m.as_str()).collect();
            for n in 1..=self.options.word_ngram.min(words.len()) {
                for window in words.windows(n) {
                    bump(b"w", &window.join(" "));
                }
            }
        }

        if self.options.char_ngram > 0 {
            let bracketed: Vec<char> = format!("<{lower}>").chars().collect();
            let n = self.options.char_ngram.min(bracketed.len());
            for window in bracketed.windows(n) {
                bump(b"c", &window.iter().collect::<String>());
            }
        }

        let norm = counts.values().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            counts.values_mut().for_each(|v| *v /= norm);
        }
        SparseVector::from_sorted(counts)
    }

    fn bucket(&self, kind: &[u8], gram: &str) -> u32 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind);
        hasher.update(&[0]);
        hasher.update(gram.as_bytes());
        let hash = hasher.finalize();
        let bytes = hash.as_bytes();
        let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        raw & ((1u32 << self.options.hash_bits) - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn featurizer() -> TextFeaturizer {
        TextFeaturizer::new(FeaturizerOptions::default()).unwrap()
    }

    #[test]
    fn vectors_are_unit_length_and_sorted() {
        let v = featurizer().featurize("Quarterly Report 2024.docx");
        assert!(v.nnz() > 0);
        assert!((v.norm() - 1.0).abs() < 1e-5);
        let indices: Vec<usize> = v.iter().map(|(i, _)| i).collect();
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        assert!(indices.iter().all(|&i| i < featurizer().dim()));
    }

    #[test]
    fn featurization_is_case_insensitive_and_deterministic() {
        let f = featurizer();
        assert_eq!(f.featurize("Invoice.PDF"), f.featurize("invoice.pdf"));
        assert_ne!(f.featurize("invoice.pdf"), f.featurize("holiday.jpg"));
    }

    #[test]
    fn short_and_empty_names_still_produce_features() {
        let f = featurizer();
        assert!(f.featurize("").nnz() > 0);
        assert!(f.featurize("a").nnz() > 0);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let mut options = FeaturizerOptions::default();
        options.hash_bits = 30;
        assert!(TextFeaturizer::new(options).is_err());
        let options = FeaturizerOptions {
            word_ngram: 0,
            char_ngram: 0,
            ..FeaturizerOptions::default()
        };
        assert!(TextFeaturizer::new(options).is_err());
    }

    #[test]
    fn dot_and_add_scaled_agree() {
        let v = featurizer().featurize("notes.txt");
        let mut dense = vec![0.0f32; featurizer().dim()];
        v.add_scaled_to(&mut dense, 2.0);
        assert!((v.dot(&dense) - 2.0).abs() < 1e-5);
    }
}
