//! Collaborator seams for the surrogate regressor.
//!
//! `TreeEstimator` is the boxed-trait contract a tree-ensemble backend has to
//! satisfy: configure, fit, predict, and dump the fitted tree structure.
//! `UncertaintyEstimator` is the pluggable uncertainty side; the
//! structure-aware update path has a default implementation that ignores the
//! structure, so data-only estimators implement a single method.

use ndarray::{Array1, Array2};

use crate::config::BoosterConfig;
use crate::data_handling::{CategoricalFeatures, Dataset};
use crate::error::{Result, SurrogateError};
use crate::structure::{RawEnsembleDump, TreeEnsembleStructure};

/// A configurable, clonable tree-ensemble regression backend.
pub trait TreeEstimator {
    /// Replace the backend's hyper-parameters.
    fn configure(&mut self, config: &BoosterConfig);

    /// Set the random seed used by stochastic backends. Deterministic
    /// backends may retain it without effect.
    fn set_seed(&mut self, seed: Option<u64>);

    /// Toggle backend training output.
    fn set_verbosity(&mut self, verbose: bool);

    /// An unfitted copy carrying the same configuration, seed, and
    /// verbosity.
    fn fresh_clone(&self) -> Box<dyn TreeEstimator>;

    /// Train on the dataset. Columns listed in `categorical` carry category
    /// codes rather than continuous values.
    fn fit(&mut self, data: &Dataset, categorical: &CategoricalFeatures) -> Result<()>;

    /// Point predictions, one per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Dump the fitted ensemble's internal tree representation.
    fn dump_structure(&self) -> Result<RawEnsembleDump>;

    fn name(&self) -> &str {
        "estimator"
    }
}

/// A stateful per-sample uncertainty source updated alongside the ensemble.
pub trait UncertaintyEstimator {
    /// Update from training data alone.
    fn update(&mut self, data: &Dataset, categorical: &CategoricalFeatures) -> Result<()>;

    /// Update from training data plus the fitted ensemble's exported
    /// structure. Estimators that do not depend on tree structure inherit
    /// this delegation to [`UncertaintyEstimator::update`].
    fn update_with_structure(
        &mut self,
        data: &Dataset,
        _structure: &TreeEnsembleStructure,
        categorical: &CategoricalFeatures,
    ) -> Result<()> {
        self.update(data, categorical)
    }

    /// Per-sample uncertainty, one value per row of `x`. When `scaled` is
    /// true the values are normalized to the unit range; otherwise they are
    /// expressed on the target's scale.
    fn predict(&self, x: &Array2<f64>, scaled: bool) -> Result<Array1<f64>>;
}

/// Placeholder uncertainty collaborator returning a fixed unit-range value
/// for every sample. `update` records the target spread so unscaled
/// predictions can be expressed on the target's scale.
#[derive(Debug, Clone)]
pub struct ConstantUncertainty {
    value: f64,
    target_spread: Option<f64>,
}

impl ConstantUncertainty {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            target_spread: None,
        }
    }
}

impl UncertaintyEstimator for ConstantUncertainty {
    fn update(&mut self, data: &Dataset, _categorical: &CategoricalFeatures) -> Result<()> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in data.targets() {
            min = min.min(v);
            max = max.max(v);
        }
        self.target_spread = Some(if max > min { max - min } else { 1.0 });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>, scaled: bool) -> Result<Array1<f64>> {
        let spread = self.target_spread.ok_or(SurrogateError::NotFitted)?;
        let value = if scaled { self.value } else { self.value * spread };
        Ok(Array1::from_elem(x.nrows(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn constant_uncertainty_scales_with_target_spread() {
        let x = arr2(&[[1.0], [2.0], [3.0]]);
        let y = ndarray::arr1(&[0.0, 5.0, 10.0]);
        let data = Dataset::new(x.clone(), y).unwrap();

        let mut unc = ConstantUncertainty::new(0.2);
        assert!(matches!(
            unc.predict(&x, true),
            Err(SurrogateError::NotFitted)
        ));

        unc.update(&data, &CategoricalFeatures::none(1)).unwrap();
        let scaled = unc.predict(&x, true).unwrap();
        let raw = unc.predict(&x, false).unwrap();
        assert_eq!(scaled.len(), 3);
        assert!((scaled[0] - 0.2).abs() < 1e-12);
        assert!((raw[0] - 2.0).abs() < 1e-12);
    }
}
