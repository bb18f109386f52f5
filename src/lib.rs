//! tree-surrogate: gradient-boosted tree regression with uncertainty-aware
//! predictions and tree-structure export.
//!
//! This crate provides a regression adapter that owns a clonable
//! tree-ensemble backend (the `gbdt` crate by default) and a pluggable
//! uncertainty estimator. Fitting trains both; prediction returns point
//! estimates, optionally paired with per-sample uncertainty; and the fitted
//! ensemble can be exported as a canonical, backend-independent tree
//! structure for consumption by optimizer-facing model builders.
//!
//! The design favors small, testable modules with boxed-trait seams so
//! alternative backends and uncertainty estimators can be plugged in without
//! touching the adapter.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod models;
pub mod regressor;
pub mod structure;

pub use config::BoosterConfig;
pub use data_handling::{CategoricalFeatures, Dataset};
pub use error::{Result, SurrogateError};
pub use models::estimator::{ConstantUncertainty, TreeEstimator, UncertaintyEstimator};
pub use models::factory::default_estimator;
pub use regressor::{BaseSource, SurrogateRegressor, UncertaintyCoupling};
pub use structure::{RawEnsembleDump, SplitCondition, StructureNode, TreeEnsembleStructure};
