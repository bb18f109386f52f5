pub mod estimator;
pub mod factory;
pub mod gbdt;
