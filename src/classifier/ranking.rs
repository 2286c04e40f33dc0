//! Top-k reduction of score vectors and the confidence decision.

use serde::Serialize;

use super::ClassifierError;

/// Label assigned when the best score is below the threshold.
pub const NONE_LABEL: &str = "none";
/// Default minimum top score for assigning a label.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.3;
/// Entries in a single-file prediction.
pub const TOP_K: usize = 3;

/// Clamp a threshold into `0..=1`; non-finite values fall back to the default.
pub fn normalize_threshold(threshold: f32) -> f32 {
    if threshold.is_finite() {
        threshold.clamp(0.0, 1.0)
    } else {
        DEFAULT_CONFIDENCE_THRESHOLD
    }
}

/// One ranked entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
    /// Position of the label in the model schema.
    pub label_index: usize,
}

/// Entries ordered by score, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPrediction {
    pub entries: Vec<LabelScore>,
}

impl RankedPrediction {
    pub fn top(&self) -> Option<&LabelScore> {
        self.entries.first()
    }

    /// The top label when its score reaches `threshold`, otherwise `"none"`.
    pub fn assigned_label(&self, threshold: f32) -> &str {
        match self.top() {
            Some(top) if top.score >= threshold => &top.label,
            _ => NONE_LABEL,
        }
    }
}

/// Indices of the `k` largest scores, best first.
///
/// Single pass over `(score, index)` pairs. Every position is a candidate, so
/// zero scores can be returned. Ties keep the lower index first and NaN ranks
/// below every number.
pub fn top_k(scores: &[f32], k: usize) -> Result<Vec<(usize, f32)>, ClassifierError> {
    if scores.len() < k {
        return Err(ClassifierError::TooFewClasses {
            found: scores.len(),
            required: k,
        });
    }
    let mut best: Vec<(usize, f32)> = Vec::with_capacity(k + 1);
    for (idx, &score) in scores.iter().enumerate() {
        let position = best
            .iter()
            .position(|&(_, held)| ranks_above(score, held))
            .unwrap_or(best.len());
        if position < k {
            best.insert(position, (idx, score));
            best.truncate(k);
        }
    }
    Ok(best)
}

fn ranks_above(candidate: f32, held: f32) -> bool {
    match (candidate.is_nan(), held.is_nan()) {
        (false, true) => true,
        (true, _) => false,
        (false, false) => candidate > held,
    }
}

/// Rank the `k` best labels of a score vector aligned with `labels`.
pub fn rank(scores: &[f32], labels: &[String], k: usize) -> Result<RankedPrediction, ClassifierError> {
    let entries = top_k(scores, k)?
        .into_iter()
        .map(|(label_index, score)| LabelScore {
            label: labels
                .get(label_index)
                .cloned()
                .unwrap_or_else(|| NONE_LABEL.to_string()),
            score,
            label_index,
        })
        .collect();
    Ok(RankedPrediction { entries })
}
