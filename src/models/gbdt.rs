//! Tree-ensemble backend over the `gbdt` crate.

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use log::warn;
use ndarray::{Array1, Array2};
use serde::Deserialize;

use crate::config::BoosterConfig;
use crate::data_handling::{CategoricalFeatures, Dataset};
use crate::error::{Result, SurrogateError};
use crate::models::estimator::TreeEstimator;
use crate::structure::{RawCondition, RawEnsembleDump, RawNode, RawTree};

/// Gradient-boosted regression backend.
///
/// Training is delegated to [`gbdt::gradient_boost::GBDT`]. With the default
/// sample ratios of 1.0 the backend trains deterministically; the seed is
/// retained for configuration parity but has no effect on it.
pub struct GbdtEstimator {
    config: BoosterConfig,
    seed: Option<u64>,
    verbose: bool,
    model: Option<GBDT>,
}

impl GbdtEstimator {
    pub fn new(config: BoosterConfig) -> Self {
        GbdtEstimator {
            config,
            seed: None,
            verbose: false,
            model: None,
        }
    }
}

impl TreeEstimator for GbdtEstimator {
    fn configure(&mut self, config: &BoosterConfig) {
        self.config = config.clone();
    }

    fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }

    fn set_verbosity(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn fresh_clone(&self) -> Box<dyn TreeEstimator> {
        Box::new(GbdtEstimator {
            config: self.config.clone(),
            seed: self.seed,
            verbose: self.verbose,
            model: None,
        })
    }

    fn fit(&mut self, data: &Dataset, categorical: &CategoricalFeatures) -> Result<()> {
        if !categorical.is_empty() {
            // no native categorical splits in this backend
            warn!(
                "gbdt backend treats {} declared categorical column(s) as ordinal codes",
                categorical.len()
            );
        }

        let mut conf = Config::new();
        conf.set_feature_size(data.n_features());
        conf.set_shrinkage(self.config.learning_rate as f32);
        conf.set_max_depth(self.config.max_depth);
        conf.set_iterations(self.config.n_estimators);
        if let Some(min_leaf) = self.config.min_child_samples {
            conf.set_min_leaf_size(min_leaf);
        }
        conf.set_loss(&self.config.loss);
        conf.set_debug(self.verbose);
        conf.set_training_optimization_level(self.config.training_optimization_level);
        conf.set_feature_sample_ratio(self.config.feature_sample_ratio);
        conf.set_data_sample_ratio(self.config.data_sample_ratio);

        let mut train: DataVec = Vec::with_capacity(data.n_samples());
        for (row, &label) in data.features().rows().into_iter().zip(data.targets()) {
            let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
            train.push(Data::new_training_data(features, 1.0, label as f32, None));
        }

        let mut model = GBDT::new(&conf);
        model.fit(&mut train);
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let model = self.model.as_ref().ok_or(SurrogateError::NotFitted)?;

        let mut test: DataVec = Vec::with_capacity(x.nrows());
        for row in x.rows() {
            let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
            test.push(Data::new_test_data(features, None));
        }

        let preds = model.predict(&test);
        Ok(preds.into_iter().map(f64::from).collect())
    }

    fn dump_structure(&self) -> Result<RawEnsembleDump> {
        let model = self.model.as_ref().ok_or(SurrogateError::NotFitted)?;

        let image = serde_json::to_value(model)
            .and_then(serde_json::from_value::<ModelImage>)
            .map_err(|e| {
                SurrogateError::Training(format!("cannot introspect gbdt model: {}", e))
            })?;

        let mut trees = Vec::with_capacity(image.trees.len());
        for tree in &image.trees {
            trees.push(RawTree {
                root: build_node(&tree.tree.tree, 0)?,
            });
        }

        Ok(RawEnsembleDump {
            n_features: image.conf.feature_size,
            base_score: image.bias,
            shrinkage: image.conf.shrinkage,
            trees,
        })
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}

// Mirror of the gbdt crate's serialized model layout, reduced to the fields
// the structure dump needs. Node indices address the flat node vector; a
// child index of 0 means the child is absent.
#[derive(Deserialize)]
struct ModelImage {
    conf: ConfImage,
    trees: Vec<TreeImage>,
    bias: f64,
}

#[derive(Deserialize)]
struct ConfImage {
    feature_size: usize,
    shrinkage: f64,
}

#[derive(Deserialize)]
struct TreeImage {
    tree: NodeStoreImage,
}

#[derive(Deserialize)]
struct NodeStoreImage {
    tree: Vec<NodeImage>,
}

#[derive(Deserialize)]
struct NodeImage {
    value: SplitImage,
    left: usize,
    right: usize,
}

#[derive(Deserialize)]
struct SplitImage {
    feature_index: usize,
    feature_value: f64,
    pred: f64,
    is_leaf: bool,
}

fn build_node(nodes: &[NodeImage], at: usize) -> Result<RawNode> {
    let node = nodes.get(at).ok_or_else(|| {
        SurrogateError::Training(format!("gbdt dump references missing node {}", at))
    })?;

    if node.value.is_leaf {
        return Ok(RawNode::Leaf {
            value: node.value.pred,
        });
    }
    if node.left == 0 || node.right == 0 {
        return Err(SurrogateError::Training(format!(
            "gbdt split node {} is missing a child",
            at
        )));
    }

    Ok(RawNode::Split {
        feature: node.value.feature_index,
        condition: RawCondition::Threshold(node.value.feature_value),
        left: Box::new(build_node(nodes, node.left)?),
        right: Box::new(build_node(nodes, node.right)?),
    })
}
