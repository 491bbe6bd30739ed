//! Regression model evaluators
//!
//! Two artifact kinds are supported: a plain linear model and a gradient
//! boosted tree ensemble in XGBoost's JSON dump layout.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::features::FeatureVector;

/// Errors that can occur while loading or evaluating a model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Model file not found: {0}")]
    FileNotFound(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Model version mismatch: expected v{expected}, found v{found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Model feature order does not match: expected {expected:?}, found {found:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("Invalid model: {0}")]
    Invalid(String),
    #[error("Expected {expected} input features, got {found}")]
    InputLength { expected: usize, found: usize },
    #[error("Model produced a non-finite prediction")]
    NonFinite,
}

/// A fitted regression model that maps one feature row to one value.
pub trait Regressor: Send + Sync + Debug {
    /// Evaluate a single row in `FeatureVector::NAMES` order.
    fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError>;

    /// Short identifier for logging
    fn kind(&self) -> &'static str;
}

fn check_len(row: &[f64]) -> Result<(), ModelError> {
    if row.len() != FeatureVector::NUM_FEATURES {
        return Err(ModelError::InputLength {
            expected: FeatureVector::NUM_FEATURES,
            found: row.len(),
        });
    }
    Ok(())
}

// ==================== Linear Model ====================

/// `intercept + Σ coefficient_i * x_i`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Result<Self, ModelError> {
        if coefficients.len() != FeatureVector::NUM_FEATURES {
            return Err(ModelError::Invalid(format!(
                "linear model has {} coefficients, expected {}",
                coefficients.len(),
                FeatureVector::NUM_FEATURES
            )));
        }
        Ok(Self {
            intercept,
            coefficients,
        })
    }
}

impl Regressor for LinearModel {
    fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        check_len(row)?;
        let value = self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>();
        Ok(value)
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}

// ==================== Tree Ensemble ====================

/// One node of an XGBoost JSON dump (`Booster.dump_model(..., dump_format="json")`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DumpNode {
    Split {
        nodeid: u32,
        split: String,
        split_condition: f64,
        yes: u32,
        no: u32,
        missing: u32,
        children: Vec<DumpNode>,
    },
    Leaf {
        nodeid: u32,
        leaf: f64,
    },
}

impl DumpNode {
    fn nodeid(&self) -> u32 {
        match self {
            DumpNode::Split { nodeid, .. } | DumpNode::Leaf { nodeid, .. } => *nodeid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Split {
        feature: usize,
        /// XGBoost compares in single precision
        threshold: f32,
        yes: usize,
        no: usize,
        missing: usize,
    },
    Leaf(f64),
}

/// A single tree flattened so nodes are addressed by their dump `nodeid`.
#[derive(Debug, Clone, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn compile(root: &DumpNode) -> Result<Self, ModelError> {
        let mut dumps = Vec::new();
        let mut stack = vec![root];
        while let Some(dump) = stack.pop() {
            if let DumpNode::Split { children, .. } = dump {
                stack.extend(children.iter());
            }
            dumps.push(dump);
        }

        // Node ids are dense: 0..count
        let count = dumps.len();
        let mut slots: Vec<Option<Node>> = vec![None; count];

        for dump in dumps {
            let id = dump.nodeid() as usize;
            if id >= count {
                return Err(ModelError::Invalid(format!(
                    "node id {} out of range for a tree of {} nodes",
                    id, count
                )));
            }
            if slots[id].is_some() {
                return Err(ModelError::Invalid(format!("duplicate node id {}", id)));
            }

            let node = match dump {
                DumpNode::Leaf { leaf, .. } => Node::Leaf(*leaf),
                DumpNode::Split {
                    split,
                    split_condition,
                    yes,
                    no,
                    missing,
                    ..
                } => Node::Split {
                    feature: resolve_feature(split)?,
                    threshold: *split_condition as f32,
                    yes: *yes as usize,
                    no: *no as usize,
                    missing: *missing as usize,
                },
            };
            slots[id] = Some(node);
        }

        let nodes = slots
            .into_iter()
            .enumerate()
            .map(|(id, slot)| {
                slot.ok_or_else(|| ModelError::Invalid(format!("missing node id {}", id)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Every branch must point at an existing node
        for node in &nodes {
            if let Node::Split { yes, no, missing, .. } = node {
                if [*yes, *no, *missing].iter().any(|&target| target >= nodes.len()) {
                    return Err(ModelError::Invalid("branch to unknown node".to_string()));
                }
            }
        }

        Ok(Self { nodes })
    }

    fn evaluate(&self, row: &[f64]) -> Result<f64, ModelError> {
        let mut idx = 0;
        // A valid tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..self.nodes.len() {
            match self.nodes[idx] {
                Node::Leaf(value) => return Ok(value),
                Node::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    let x = row[feature];
                    idx = if x.is_nan() {
                        missing
                    } else if (x as f32) < threshold {
                        yes
                    } else {
                        no
                    };
                }
            }
        }
        Err(ModelError::Invalid("tree contains a cycle".to_string()))
    }
}

/// Map a split feature (`f3` or a column name) to its row index.
fn resolve_feature(split: &str) -> Result<usize, ModelError> {
    let index = match split.strip_prefix('f').and_then(|n| n.parse::<usize>().ok()) {
        Some(index) => Some(index),
        None => FeatureVector::index_of(split),
    };
    index
        .filter(|&i| i < FeatureVector::NUM_FEATURES)
        .ok_or_else(|| ModelError::Invalid(format!("unknown split feature {:?}", split)))
}

/// Gradient boosted regression trees: `base_score + Σ tree(x)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    base_score: f64,
    trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn from_dump(base_score: f64, dump: &[DumpNode]) -> Result<Self, ModelError> {
        if dump.is_empty() {
            return Err(ModelError::Invalid("tree ensemble has no trees".to_string()));
        }
        let trees = dump.iter().map(Tree::compile).collect::<Result<_, _>>()?;
        Ok(Self { base_score, trees })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for TreeEnsemble {
    fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        check_len(row)?;
        self.trees
            .iter()
            .try_fold(self.base_score, |acc, tree| Ok(acc + tree.evaluate(row)?))
    }

    fn kind(&self) -> &'static str {
        "tree_ensemble"
    }
}
