//! Tree-ensemble structure export.
//!
//! A fitted backend dumps its trees as a [`RawEnsembleDump`], a direct image
//! of whatever the backend stores internally. [`TreeEnsembleStructure`]
//! normalizes that dump into a canonical, backend-independent form that a
//! downstream model builder can re-ingest: nodes are flattened in preorder,
//! categorical membership sets are sorted and deduplicated, and leaf values
//! are pre-scaled by the learning rate so that a prediction is simply the
//! base score plus one leaf contribution per tree.

use std::fs::File;
use std::path::Path;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::data_handling::CategoricalFeatures;
use crate::error::{Result, SurrogateError};

/// Split condition as emitted by a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RawCondition {
    /// Numeric split: values strictly below the threshold go left.
    Threshold(f64),
    /// Categorical split: category codes in the set go left.
    Membership(Vec<u32>),
}

/// One node of a backend-dumped tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RawNode {
    Split {
        feature: usize,
        condition: RawCondition,
        left: Box<RawNode>,
        right: Box<RawNode>,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTree {
    pub root: RawNode,
}

/// The fitted ensemble exactly as the backend stores it, before
/// normalization. Leaf values are the backend's raw per-tree outputs;
/// `shrinkage` is the factor the backend applies to them at prediction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEnsembleDump {
    pub n_features: usize,
    pub base_score: f64,
    pub shrinkage: f64,
    pub trees: Vec<RawTree>,
}

/// Write a raw dump as pretty-printed JSON. Only invoked when a dump path
/// was explicitly configured on the regressor.
pub fn write_raw_dump(dump: &RawEnsembleDump, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        SurrogateError::Config(format!(
            "cannot create structure dump file {}: {}",
            path.display(),
            e
        ))
    })?;
    serde_json::to_writer_pretty(file, dump).map_err(|e| {
        SurrogateError::Config(format!(
            "cannot serialize structure dump to {}: {}",
            path.display(),
            e
        ))
    })
}

/// Normalized split condition. `InSet` lists are sorted ascending with no
/// duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SplitCondition {
    LessThan(f64),
    InSet(Vec<u32>),
}

/// One entry of a canonically ordered tree. Nodes are stored in preorder:
/// a split's left child is the entry that immediately follows it, and
/// `right_index` points at the first entry of its right subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructureNode {
    Split {
        feature: usize,
        condition: SplitCondition,
        right_index: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeStructure {
    nodes: Vec<StructureNode>,
}

impl TreeStructure {
    pub fn nodes(&self) -> &[StructureNode] {
        &self.nodes
    }

    /// Route one sample down the tree and return its leaf contribution.
    pub fn leaf_value(&self, row: ArrayView1<f64>) -> f64 {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                StructureNode::Leaf { value } => return *value,
                StructureNode::Split {
                    feature,
                    condition,
                    right_index,
                } => {
                    let goes_left = match condition {
                        SplitCondition::LessThan(threshold) => row[*feature] < *threshold,
                        SplitCondition::InSet(codes) => {
                            let code = row[*feature].round() as u32;
                            codes.binary_search(&code).is_ok()
                        }
                    };
                    at = if goes_left { at + 1 } else { *right_index };
                }
            }
        }
    }
}

/// Canonical, backend-independent image of a fitted tree ensemble.
///
/// A prediction for a sample is `base_score()` plus the sum of
/// [`TreeStructure::leaf_value`] over all trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsembleStructure {
    n_features: usize,
    base_score: f64,
    categorical: Vec<usize>,
    trees: Vec<TreeStructure>,
}

impl TreeEnsembleStructure {
    /// Normalize a backend dump. Validates that split features are within
    /// range and that membership conditions only appear on columns declared
    /// categorical.
    pub fn from_raw(raw: &RawEnsembleDump, categorical: &CategoricalFeatures) -> Result<Self> {
        if categorical.n_features() != raw.n_features {
            return Err(SurrogateError::Config(format!(
                "dump declares {} features but categorical set was built for {}",
                raw.n_features,
                categorical.n_features()
            )));
        }
        let mut trees = Vec::with_capacity(raw.trees.len());
        for tree in &raw.trees {
            let mut nodes = Vec::new();
            flatten(&tree.root, raw, categorical, &mut nodes)?;
            trees.push(TreeStructure { nodes });
        }
        Ok(Self {
            n_features: raw.n_features,
            base_score: raw.base_score,
            categorical: categorical.indices().to_vec(),
            trees,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[TreeStructure] {
        &self.trees
    }

    /// Column indices that were declared categorical at fit time.
    pub fn categorical_columns(&self) -> &[usize] {
        &self.categorical
    }

    pub fn n_nodes(&self) -> usize {
        self.trees.iter().map(|t| t.nodes.len()).sum()
    }

    /// Evaluate the exported ensemble for one sample.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|tree| tree.leaf_value(row))
                .sum::<f64>()
    }
}

fn flatten(
    node: &RawNode,
    raw: &RawEnsembleDump,
    categorical: &CategoricalFeatures,
    out: &mut Vec<StructureNode>,
) -> Result<()> {
    match node {
        RawNode::Leaf { value } => {
            out.push(StructureNode::Leaf {
                value: value * raw.shrinkage,
            });
        }
        RawNode::Split {
            feature,
            condition,
            left,
            right,
        } => {
            if *feature >= raw.n_features {
                return Err(SurrogateError::Config(format!(
                    "split references feature {} but the dump has {} features",
                    feature, raw.n_features
                )));
            }
            let condition = match condition {
                RawCondition::Threshold(threshold) => SplitCondition::LessThan(*threshold),
                RawCondition::Membership(codes) => {
                    if !categorical.contains(*feature) {
                        return Err(SurrogateError::Config(format!(
                            "membership split on feature {} which was not declared categorical",
                            feature
                        )));
                    }
                    let mut codes = codes.clone();
                    codes.sort_unstable();
                    codes.dedup();
                    SplitCondition::InSet(codes)
                }
            };
            let slot = out.len();
            out.push(StructureNode::Split {
                feature: *feature,
                condition,
                right_index: 0,
            });
            flatten(left, raw, categorical, out)?;
            let right_start = out.len();
            flatten(right, raw, categorical, out)?;
            if let StructureNode::Split { right_index, .. } = &mut out[slot] {
                *right_index = right_start;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    fn leaf(value: f64) -> RawNode {
        RawNode::Leaf { value }
    }

    fn split(feature: usize, condition: RawCondition, left: RawNode, right: RawNode) -> RawNode {
        RawNode::Split {
            feature,
            condition,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn sample_dump() -> RawEnsembleDump {
        // tree 0: numeric split on feature 0
        // tree 1: categorical split on feature 1 with an unsorted set
        RawEnsembleDump {
            n_features: 2,
            base_score: 0.5,
            shrinkage: 0.1,
            trees: vec![
                RawTree {
                    root: split(
                        0,
                        RawCondition::Threshold(1.5),
                        split(0, RawCondition::Threshold(0.5), leaf(1.0), leaf(2.0)),
                        leaf(3.0),
                    ),
                },
                RawTree {
                    root: split(
                        1,
                        RawCondition::Membership(vec![4, 2, 2, 0]),
                        leaf(-1.0),
                        leaf(1.0),
                    ),
                },
            ],
        }
    }

    #[test]
    fn normalization_orders_nodes_in_preorder() {
        let cats = CategoricalFeatures::new(&[1], 2).unwrap();
        let structure = TreeEnsembleStructure::from_raw(&sample_dump(), &cats).unwrap();

        assert_eq!(structure.n_trees(), 2);
        let nodes = structure.trees()[0].nodes();
        assert_eq!(nodes.len(), 5);
        // root split, then the whole left subtree, then the right leaf
        match &nodes[0] {
            StructureNode::Split { right_index, .. } => assert_eq!(*right_index, 4),
            other => panic!("expected split at root, got {:?}", other),
        }
        match &nodes[1] {
            StructureNode::Split { right_index, .. } => assert_eq!(*right_index, 3),
            other => panic!("expected inner split, got {:?}", other),
        }
        assert!(matches!(nodes[2], StructureNode::Leaf { .. }));
        assert!(matches!(nodes[4], StructureNode::Leaf { .. }));
    }

    #[test]
    fn membership_sets_are_sorted_and_deduplicated() {
        let cats = CategoricalFeatures::new(&[1], 2).unwrap();
        let structure = TreeEnsembleStructure::from_raw(&sample_dump(), &cats).unwrap();
        match &structure.trees()[1].nodes()[0] {
            StructureNode::Split {
                condition: SplitCondition::InSet(codes),
                ..
            } => assert_eq!(codes, &vec![0, 2, 4]),
            other => panic!("expected membership split, got {:?}", other),
        }
    }

    #[test]
    fn leaf_values_are_scaled_by_shrinkage() {
        let cats = CategoricalFeatures::new(&[1], 2).unwrap();
        let structure = TreeEnsembleStructure::from_raw(&sample_dump(), &cats).unwrap();

        // feature 0 = 0.2 -> tree 0 leaf 1.0; feature 1 = 2 -> in set -> -1.0
        let pred = structure.predict_row(arr1(&[0.2, 2.0]).view());
        let expected = 0.5 + 0.1 * 1.0 + 0.1 * (-1.0);
        assert!((pred - expected).abs() < 1e-12);

        // feature 0 = 5.0 -> tree 0 right leaf 3.0; feature 1 = 3 -> not in set -> 1.0
        let pred = structure.predict_row(arr1(&[5.0, 3.0]).view());
        let expected = 0.5 + 0.1 * 3.0 + 0.1 * 1.0;
        assert!((pred - expected).abs() < 1e-12);
    }

    #[test]
    fn membership_on_numeric_column_is_rejected() {
        let cats = CategoricalFeatures::none(2);
        let err = TreeEnsembleStructure::from_raw(&sample_dump(), &cats).unwrap_err();
        assert!(matches!(err, SurrogateError::Config(_)));
    }

    #[test]
    fn split_feature_out_of_range_is_rejected() {
        let dump = RawEnsembleDump {
            n_features: 1,
            base_score: 0.0,
            shrinkage: 1.0,
            trees: vec![RawTree {
                root: split(3, RawCondition::Threshold(0.0), leaf(0.0), leaf(1.0)),
            }],
        };
        let cats = CategoricalFeatures::none(1);
        let err = TreeEnsembleStructure::from_raw(&dump, &cats).unwrap_err();
        assert!(matches!(err, SurrogateError::Config(_)));
    }

    #[test]
    fn feature_count_mismatch_is_rejected() {
        let cats = CategoricalFeatures::none(3);
        let err = TreeEnsembleStructure::from_raw(&sample_dump(), &cats).unwrap_err();
        assert!(matches!(err, SurrogateError::Config(_)));
    }
}
