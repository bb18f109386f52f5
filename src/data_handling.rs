//! Training-data containers and categorical-column bookkeeping.
//!
//! `Dataset` bundles a feature matrix with its target vector and checks the
//! shapes once at construction. `CategoricalFeatures` is the validated set of
//! column indices that carry category codes rather than continuous values; it
//! is built against a known column count so out-of-range indices are rejected
//! up front instead of somewhere inside a fit call.

use log::debug;
use ndarray::{Array1, Array2};

use crate::error::{Result, SurrogateError};

/// Validated set of categorical column indices for a feature matrix with a
/// fixed number of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalFeatures {
    indices: Vec<usize>,
    n_features: usize,
}

impl CategoricalFeatures {
    /// Build the set from raw column indices. Indices are deduplicated and
    /// stored sorted. Fails if any index is out of range for `n_features`.
    pub fn new(indices: &[usize], n_features: usize) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= n_features) {
            return Err(SurrogateError::Config(format!(
                "categorical column index {} out of range for {} features",
                bad, n_features
            )));
        }
        let mut indices = indices.to_vec();
        indices.sort_unstable();
        indices.dedup();
        Ok(Self {
            indices,
            n_features,
        })
    }

    /// An empty set for a matrix with `n_features` columns.
    pub fn none(n_features: usize) -> Self {
        Self {
            indices: Vec::new(),
            n_features,
        }
    }

    pub fn contains(&self, column: usize) -> bool {
        self.indices.binary_search(&column).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

/// A feature matrix (rows = samples) paired with one target value per row.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Array2<f64>,
    y: Array1<f64>,
}

impl Dataset {
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        check_rows_match(&x, &y)?;
        debug!(
            "dataset: {} samples, {} features",
            x.nrows(),
            x.ncols()
        );
        Ok(Self { x, y })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn targets(&self) -> &Array1<f64> {
        &self.y
    }
}

/// Check that a feature matrix and a target vector agree on the sample count.
pub fn check_rows_match(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(SurrogateError::Config(format!(
            "feature matrix has {} rows but target vector has {} entries",
            x.nrows(),
            y.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn categorical_indices_are_sorted_and_deduplicated() {
        let cats = CategoricalFeatures::new(&[3, 1, 3, 0], 5).unwrap();
        assert_eq!(cats.indices(), &[0, 1, 3]);
        assert!(cats.contains(1));
        assert!(!cats.contains(2));
        assert_eq!(cats.len(), 3);
        assert_eq!(cats.n_features(), 5);
    }

    #[test]
    fn categorical_index_out_of_range_is_rejected() {
        let err = CategoricalFeatures::new(&[0, 5], 5).unwrap_err();
        assert!(matches!(err, SurrogateError::Config(_)));
    }

    #[test]
    fn dataset_rejects_row_count_mismatch() {
        let x = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let y = Array1::from_vec(vec![1.0, 2.0, 3.0]);
        assert!(Dataset::new(x, y).is_err());
    }

    #[test]
    fn dataset_reports_shape() {
        let x = arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let y = Array1::from_vec(vec![1.0, 2.0, 3.0]);
        let ds = Dataset::new(x, y).unwrap();
        assert_eq!(ds.n_samples(), 3);
        assert_eq!(ds.n_features(), 2);
    }
}
