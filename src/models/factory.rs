use crate::config::BoosterConfig;
use crate::models::estimator::TreeEstimator;
use crate::models::gbdt::GbdtEstimator;

/// Build the default boxed tree-ensemble backend from a config.
pub fn default_estimator(config: BoosterConfig) -> Box<dyn TreeEstimator> {
    Box::new(GbdtEstimator::new(config))
}
