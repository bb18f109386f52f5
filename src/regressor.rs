//! The surrogate regressor: a tree-ensemble backend paired with an
//! uncertainty estimator.
//!
//! Fitting clones the configured backend into a fresh instance, trains it,
//! and updates the uncertainty estimator. The two coupling policies differ
//! only in ordering: [`UncertaintyCoupling::DataDriven`] updates the
//! uncertainty estimator from the training data before the ensemble is
//! fitted, while [`UncertaintyCoupling::StructureAware`] fits the ensemble
//! first and hands its exported structure to the estimator. A data-driven
//! regressor never routes tree structure into its uncertainty estimator.

use std::path::PathBuf;

use log::debug;
use ndarray::{Array1, Array2};

use crate::config::BoosterConfig;
use crate::data_handling::{CategoricalFeatures, Dataset};
use crate::error::{Result, SurrogateError};
use crate::models::estimator::{TreeEstimator, UncertaintyEstimator};
use crate::structure::{write_raw_dump, TreeEnsembleStructure};

/// When the uncertainty estimator is updated relative to the ensemble fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UncertaintyCoupling {
    /// Update from (x, y) before the ensemble is fitted; the estimator never
    /// sees tree structure.
    DataDriven,
    /// Fit the ensemble first, then update from (x, y) plus the exported
    /// tree structure.
    StructureAware,
}

/// Base-estimator argument for [`SurrogateRegressor::new`].
///
/// Passing an existing regressor unwraps it: the new regressor takes over
/// the inner base and uncertainty estimators instead of nesting adapters.
pub enum BaseSource {
    Estimator(Box<dyn TreeEstimator>),
    Adapter(SurrogateRegressor),
}

/// Regression adapter owning a clonable tree-ensemble backend and a
/// pluggable uncertainty estimator.
pub struct SurrogateRegressor {
    base: Option<Box<dyn TreeEstimator>>,
    uncertainty: Option<Box<dyn UncertaintyEstimator>>,
    coupling: UncertaintyCoupling,
    seed: Option<u64>,
    categorical: CategoricalFeatures,
    dump_path: Option<PathBuf>,
    fitted: Option<Box<dyn TreeEstimator>>,
}

impl SurrogateRegressor {
    /// Both collaborators may be left absent at construction; `fit` then
    /// fails with a configuration error.
    pub fn new(
        base: Option<BaseSource>,
        uncertainty: Option<Box<dyn UncertaintyEstimator>>,
        coupling: UncertaintyCoupling,
        seed: Option<u64>,
        categorical: CategoricalFeatures,
    ) -> Self {
        let (base, uncertainty) = match base {
            Some(BaseSource::Adapter(inner)) => (inner.base, inner.uncertainty),
            Some(BaseSource::Estimator(est)) => (Some(est), uncertainty),
            None => (None, uncertainty),
        };
        SurrogateRegressor {
            base,
            uncertainty,
            coupling,
            seed,
            categorical,
            dump_path: None,
            fitted: None,
        }
    }

    pub fn coupling(&self) -> UncertaintyCoupling {
        self.coupling
    }

    pub fn categorical(&self) -> &CategoricalFeatures {
        &self.categorical
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Name of the configured backend, when one is present.
    pub fn base_name(&self) -> Option<&str> {
        self.base.as_deref().map(TreeEstimator::name)
    }

    /// Raw structure dumps are written to this path during
    /// [`SurrogateRegressor::export_structure`]. Off by default.
    pub fn set_structure_dump_path(&mut self, path: Option<PathBuf>) {
        self.dump_path = path;
    }

    /// Forward hyper-parameters to the base estimator. `min_child_samples`
    /// defaults to 2 when unset; nothing else is injected.
    pub fn set_params(&mut self, mut config: BoosterConfig) -> Result<()> {
        if config.min_child_samples.is_none() {
            config.min_child_samples = Some(2);
        }
        let base = self.base.as_mut().ok_or_else(|| {
            SurrogateError::Config("no base estimator to forward parameters to".to_string())
        })?;
        base.configure(&config);
        Ok(())
    }

    /// Fit the ensemble and the uncertainty estimator against the dataset.
    /// The previously fitted ensemble, if any, is discarded wholesale.
    pub fn fit(&mut self, data: &Dataset) -> Result<()> {
        if data.n_features() != self.categorical.n_features() {
            return Err(SurrogateError::Config(format!(
                "dataset has {} features but categorical set was built for {}",
                data.n_features(),
                self.categorical.n_features()
            )));
        }
        let base = self
            .base
            .as_mut()
            .ok_or_else(|| SurrogateError::Config("no base estimator configured".to_string()))?;
        let uncertainty = self.uncertainty.as_mut().ok_or_else(|| {
            SurrogateError::Config("no uncertainty estimator configured".to_string())
        })?;

        base.set_seed(self.seed);
        base.set_verbosity(false);
        let mut ensemble = base.fresh_clone();

        match self.coupling {
            UncertaintyCoupling::DataDriven => {
                uncertainty.update(data, &self.categorical)?;
                ensemble.fit(data, &self.categorical)?;
            }
            UncertaintyCoupling::StructureAware => {
                ensemble.fit(data, &self.categorical)?;
                let raw = ensemble.dump_structure()?;
                let structure = TreeEnsembleStructure::from_raw(&raw, &self.categorical)?;
                uncertainty.update_with_structure(data, &structure, &self.categorical)?;
            }
        }

        debug!(
            "fitted {} ensemble on {} samples",
            ensemble.name(),
            data.n_samples()
        );
        self.fitted = Some(ensemble);
        Ok(())
    }

    /// Point predictions from the fitted ensemble.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let fitted = self.fitted.as_ref().ok_or(SurrogateError::NotFitted)?;
        fitted.predict(x)
    }

    /// Point predictions paired with per-sample uncertainty.
    pub fn predict_with_uncertainty(
        &self,
        x: &Array2<f64>,
        scaled: bool,
    ) -> Result<(Array1<f64>, Array1<f64>)> {
        let mean = self.predict(x)?;
        let uncertainty = self.uncertainty.as_ref().ok_or_else(|| {
            SurrogateError::Config("no uncertainty estimator configured".to_string())
        })?;
        let std = uncertainty.predict(x, scaled)?;
        Ok((mean, std))
    }

    /// Export the fitted ensemble's tree structure in canonical form. When a
    /// dump path is configured, the raw backend dump is also written there
    /// as JSON before normalization.
    pub fn export_structure(&self) -> Result<TreeEnsembleStructure> {
        let fitted = self.fitted.as_ref().ok_or(SurrogateError::NotFitted)?;
        let raw = fitted.dump_structure()?;
        if let Some(path) = &self.dump_path {
            write_raw_dump(&raw, path)?;
        }
        TreeEnsembleStructure::from_raw(&raw, &self.categorical)
    }
}
