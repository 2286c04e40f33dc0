use serde::{Deserialize, Serialize};

const FIT_ITERATIONS: usize = 400;
const FIT_STEP: f32 = 0.5;

/// Platt sigmoid mapping a raw margin to a probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattCalibrator {
    pub slope: f32,
    pub offset: f32,
}

impl PlattCalibrator {
    /// `P(positive | margin)`.
    pub fn probability(&self, margin: f32) -> f32 {
        let z = self.slope * margin + self.offset;
        1.0 / (1.0 + (-z).exp())
    }

    /// Fit on training margins with Platt's smoothed targets.
    ///
    /// Plain gradient descent on the mean log-loss; the slope is kept
    /// non-negative so calibration never inverts the learner's ranking.
    pub fn fit(margins: &[f32], targets: &[bool]) -> Self {
        let positives = targets.iter().filter(|&&t| t).count() as f32;
        let negatives = targets.len() as f32 - positives;
        let hi = (positives + 1.0) / (positives + 2.0);
        let lo = 1.0 / (negatives + 2.0);
        let mut model = Self {
            slope: 1.0,
            offset: ((positives + 1.0) / (negatives + 1.0)).ln(),
        };
        if margins.is_empty() {
            return model;
        }
        let n = margins.len() as f32;
        for _ in 0..FIT_ITERATIONS {
            let mut grad_slope = 0.0f32;
            let mut grad_offset = 0.0f32;
            for (&m, &t) in margins.iter().zip(targets.iter()) {
                let target = if t { hi } else { lo };
                let diff = model.probability(m) - target;
                grad_slope += diff * m;
                grad_offset += diff;
            }
            model.slope = (model.slope - FIT_STEP * grad_slope / n).max(0.0);
            model.offset -= FIT_STEP * grad_offset / n;
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separated_margins_calibrate_to_confident_probabilities() {
        let margins = [2.0, 1.5, 1.0, -1.0, -1.5, -2.0];
        let targets = [true, true, true, false, false, false];
        let cal = PlattCalibrator::fit(&margins, &targets);
        assert!(cal.slope > 0.0);
        assert!(cal.probability(2.0) > 0.7);
        assert!(cal.probability(-2.0) < 0.3);
        assert!(cal.probability(1.0) > cal.probability(-1.0));
    }

    #[test]
    fn empty_input_keeps_prior() {
        let cal = PlattCalibrator::fit(&[], &[]);
        assert!((cal.probability(0.0) - 0.5).abs() < 1e-6);
    }
}
