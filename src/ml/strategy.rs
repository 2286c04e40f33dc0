//! Trainer strategies and the scoring heads they produce.
//!
//! `Strategy` is the configuration-facing tag; [`Strategy::trainer`] is the
//! single selection table mapping a tag to its trainer. Adding a strategy
//! means adding a variant, a trainer and one arm there.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::dataset::TrainDataset;
use super::features::SparseVector;
use super::maxent::{MaxEntModel, MaxEntOptions, train_maxent};
use super::ova::{OvaModel, OvaOptions, train_ova};

/// Classification strategy selected at training time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Single multinomial maximum entropy model.
    MaximumEntropy(MaxEntOptions),
    /// One calibrated averaged perceptron per label.
    OneVersusAll(OvaOptions),
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::OneVersusAll(OvaOptions::default())
    }
}

impl Strategy {
    /// Short identifier used on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            Strategy::MaximumEntropy(_) => "maxent",
            Strategy::OneVersusAll(_) => "ova",
        }
    }

    /// Parse an identifier into the strategy with default options.
    ///
    /// Accepts the short ids plus the numeric ids `1` (maxent) and `2` (ova).
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "maxent" | "maximum_entropy" | "sdca" | "1" => {
                Some(Strategy::MaximumEntropy(MaxEntOptions::default()))
            }
            "ova" | "one_versus_all" | "perceptron" | "2" => {
                Some(Strategy::OneVersusAll(OvaOptions::default()))
            }
            _ => None,
        }
    }

    /// Build the trainer for this strategy.
    pub fn trainer(&self, seed: u64) -> Box<dyn Trainer> {
        match *self {
            Strategy::MaximumEntropy(options) => Box::new(MaxEntTrainer { options, seed }),
            Strategy::OneVersusAll(options) => Box::new(OvaTrainer { options, seed }),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Fits a scoring head from featurized rows.
pub trait Trainer: Send + Sync {
    /// The name of this trainer (for logging).
    fn name(&self) -> &'static str;

    /// Fit a head on every row of `dataset`.
    fn fit(&self, dataset: &TrainDataset) -> Result<ScoringHead, String>;
}

struct MaxEntTrainer {
    options: MaxEntOptions,
    seed: u64,
}

impl Trainer for MaxEntTrainer {
    fn name(&self) -> &'static str {
        "maxent"
    }

    fn fit(&self, dataset: &TrainDataset) -> Result<ScoringHead, String> {
        train_maxent(dataset, &self.options, self.seed).map(ScoringHead::MaximumEntropy)
    }
}

struct OvaTrainer {
    options: OvaOptions,
    seed: u64,
}

impl Trainer for OvaTrainer {
    fn name(&self) -> &'static str {
        "ova"
    }

    fn fit(&self, dataset: &TrainDataset) -> Result<ScoringHead, String> {
        train_ova(dataset, &self.options, self.seed).map(ScoringHead::OneVersusAll)
    }
}

/// Fitted scoring function; output is aligned with the model's label list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringHead {
    MaximumEntropy(MaxEntModel),
    OneVersusAll(OvaModel),
}

impl ScoringHead {
    pub fn n_classes(&self) -> usize {
        match self {
            ScoringHead::MaximumEntropy(model) => model.n_classes,
            ScoringHead::OneVersusAll(model) => model.n_classes(),
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            ScoringHead::MaximumEntropy(model) => model.dim,
            ScoringHead::OneVersusAll(model) => model.dim,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            ScoringHead::MaximumEntropy(model) => model.validate(),
            ScoringHead::OneVersusAll(model) => model.validate(),
        }
    }

    /// Per-class probabilities summing to 1.
    pub fn predict_proba(&self, features: &SparseVector) -> Vec<f32> {
        match self {
            ScoringHead::MaximumEntropy(model) => model.predict_proba(features),
            ScoringHead::OneVersusAll(model) => model.predict_proba(features),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for strategy in [
            Strategy::MaximumEntropy(MaxEntOptions::default()),
            Strategy::OneVersusAll(OvaOptions::default()),
        ] {
            assert_eq!(Strategy::from_id(strategy.id()), Some(strategy));
        }
        assert_eq!(Strategy::from_id("1"), Strategy::from_id("maxent"));
        assert_eq!(Strategy::from_id("2"), Some(Strategy::default()));
        assert_eq!(Strategy::from_id("svm"), None);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(Strategy::default()).unwrap();
        assert_eq!(json["kind"], "one_versus_all");
        assert_eq!(json["iterations"], 10);
        let parsed: Strategy =
            serde_json::from_str(r#"{"kind":"maximum_entropy","epochs":5}"#).unwrap();
        match parsed {
            Strategy::MaximumEntropy(options) => {
                assert_eq!(options.epochs, 5);
                assert_eq!(options.batch_size, MaxEntOptions::default().batch_size);
            }
            other => panic!("unexpected strategy {other:?}"),
        }
    }

    #[test]
    fn selection_table_builds_matching_trainer() {
        assert_eq!(Strategy::default().trainer(1).name(), "ova");
        assert_eq!(Strategy::from_id("maxent").unwrap().trainer(1).name(), "maxent");
    }
}
