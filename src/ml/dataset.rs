use super::features::SparseVector;

/// In-memory featurized dataset shared by all trainers.
///
/// Rows are featurized once and reused for every cross-validation fold and
/// the final fit.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    /// Ordered class identifiers; `y` values index into this list.
    pub classes: Vec<String>,
    /// Feature dimension every row lives in.
    pub dim: usize,
    pub x: Vec<SparseVector>,
    pub y: Vec<usize>,
}

impl TrainDataset {
    /// Check shape invariants before training.
    pub fn validate(&self) -> Result<(), String> {
        if self.x.is_empty() || self.y.is_empty() {
            return Err("Empty training set".to_string());
        }
        if self.x.len() != self.y.len() {
            return Err("Mismatched training inputs/labels".to_string());
        }
        if self.classes.is_empty() {
            return Err("No classes available for training".to_string());
        }
        if self.dim == 0 {
            return Err("Feature dimension must be > 0".to_string());
        }
        if let Some(&bad) = self.y.iter().find(|&&y| y >= self.classes.len()) {
            return Err(format!(
                "Label key {bad} out of range for {} classes",
                self.classes.len()
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Rows at `indices`, keeping the full class list.
    pub fn subset(&self, indices: &[usize]) -> TrainDataset {
        TrainDataset {
            classes: self.classes.clone(),
            dim: self.dim,
            x: indices.iter().map(|&i| self.x[i].clone()).collect(),
            y: indices.iter().map(|&i| self.y[i]).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> TrainDataset {
        TrainDataset {
            classes: vec!["a".into(), "b".into()],
            dim: 4,
            x: vec![
                SparseVector::from_sorted([(0, 1.0)]),
                SparseVector::from_sorted([(1, 1.0)]),
                SparseVector::from_sorted([(2, 1.0)]),
            ],
            y: vec![0, 1, 0],
        }
    }

    #[test]
    fn validate_catches_out_of_range_labels() {
        let mut data = tiny();
        data.validate().unwrap();
        data.y[1] = 7;
        assert!(data.validate().unwrap_err().contains("out of range"));
    }

    #[test]
    fn subset_keeps_classes() {
        let sub = tiny().subset(&[2, 0]);
        assert_eq!(sub.classes.len(), 2);
        assert_eq!(sub.y, vec![0, 0]);
        assert_eq!(sub.x[0], SparseVector::from_sorted([(2, 1.0)]));
    }
}
