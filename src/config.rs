use serde::{Deserialize, Serialize};

/// Hyper-parameters forwarded to the tree-ensemble backend.
///
/// Field names follow the backend's vocabulary where one exists. `loss` is
/// passed through verbatim; for regression the backend accepts
/// `"SquaredError"` and `"LAD"`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BoosterConfig {
    pub learning_rate: f64,
    pub max_depth: u32,
    pub n_estimators: usize,
    /// Minimum number of samples required at a leaf. When unset, the
    /// regressor defaults this to 2 before forwarding.
    pub min_child_samples: Option<usize>,
    pub loss: String,
    pub training_optimization_level: u8,
    pub feature_sample_ratio: f64,
    pub data_sample_ratio: f64,
}

impl Default for BoosterConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_depth: 6,
            n_estimators: 50,
            min_child_samples: None,
            loss: "SquaredError".to_string(),
            training_optimization_level: 2,
            feature_sample_ratio: 1.0,
            data_sample_ratio: 1.0,
        }
    }
}

impl BoosterConfig {
    pub fn new(learning_rate: f64, max_depth: u32, n_estimators: usize) -> Self {
        Self {
            learning_rate,
            max_depth,
            n_estimators,
            ..Self::default()
        }
    }
}
