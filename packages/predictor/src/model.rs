//! Exported model formats.
//!
//! Two kinds are supported, selected by the `kind` field of the JSON file:
//!
//! * `forest`: an ensemble of binary regression trees. Each tree is a flat
//!   node list rooted at index 0; split nodes send `x[feature] <= threshold`
//!   to `left`, everything else to `right`. The prediction is the mean of
//!   the leaf values reached in each tree.
//! * `linear`: `intercept + sum(coefficients[i] * x[i])`.

use serde::{Deserialize, Serialize};

use crate::{FeatureMatrix, PredictError, Predictor};

/// A model file as exported from training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelFile {
    /// Tree ensemble (random forest regressor).
    Forest(ForestModel),
    /// Linear regression.
    Linear(LinearModel),
}

impl ModelFile {
    /// Parses and validates a model from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::Json`] for syntax errors and
    /// [`PredictError::Malformed`] for structural inconsistencies.
    pub fn from_json(content: &str) -> Result<Self, PredictError> {
        let model: Self = serde_json::from_str(content)?;
        model.validate()?;
        Ok(model)
    }

    /// Checks internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::Malformed`] on the first problem found.
    pub fn validate(&self) -> Result<(), PredictError> {
        match self {
            Self::Forest(m) => m.validate(),
            Self::Linear(m) => m.validate(),
        }
    }

    /// Feature names the model was trained on.
    #[must_use]
    pub fn features(&self) -> &[String] {
        match self {
            Self::Forest(m) => &m.features,
            Self::Linear(m) => &m.features,
        }
    }

    /// Short name of the model kind, for logging.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Forest(_) => "forest",
            Self::Linear(_) => "linear",
        }
    }

    /// Boxes the model behind the [`Predictor`] trait.
    #[must_use]
    pub fn into_predictor(self) -> Box<dyn Predictor> {
        match self {
            Self::Forest(m) => Box::new(m),
            Self::Linear(m) => Box::new(m),
        }
    }
}

fn malformed(message: impl Into<String>) -> PredictError {
    PredictError::Malformed {
        message: message.into(),
    }
}

fn check_width(matrix: &FeatureMatrix, features: &[String]) -> Result<(), PredictError> {
    if matrix.columns() == features {
        Ok(())
    } else {
        Err(PredictError::Shape {
            message: format!(
                "matrix columns {:?} do not match model features {features:?}",
                matrix.columns()
            ),
        })
    }
}

/// A single tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Internal split.
    Split {
        /// Index into the feature list.
        feature: usize,
        /// Split value; `x <= threshold` goes left.
        threshold: f64,
        /// Index of the left child.
        left: usize,
        /// Index of the right child.
        right: usize,
    },
    /// Terminal node.
    Leaf {
        /// Predicted value.
        value: f64,
    },
}

/// One regression tree stored as a flat node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Nodes; index 0 is the root.
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn validate(&self, tree_idx: usize, feature_count: usize) -> Result<(), PredictError> {
        if self.nodes.is_empty() {
            return Err(malformed(format!("tree {tree_idx} has no nodes")));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= feature_count {
                        return Err(malformed(format!(
                            "tree {tree_idx} node {idx} splits on feature {feature}, \
                             model has {feature_count}"
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(malformed(format!(
                            "tree {tree_idx} node {idx} has a NaN threshold"
                        )));
                    }
                    // Children must come after their parent so evaluation
                    // always terminates.
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(malformed(format!(
                                "tree {tree_idx} node {idx} has invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(malformed(format!(
                            "tree {tree_idx} leaf {idx} is not finite"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walks the tree for one feature row.
    #[must_use]
    pub fn evaluate(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Tree ensemble whose prediction is the mean over all trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    /// Feature names, in column order.
    pub features: Vec<String>,
    /// Trees of the ensemble.
    pub trees: Vec<Tree>,
}

impl ForestModel {
    fn validate(&self) -> Result<(), PredictError> {
        if self.trees.is_empty() {
            return Err(malformed("forest has no trees"));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(idx, self.features.len())?;
        }
        Ok(())
    }

    /// Predicts a single row.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.evaluate(row)).sum();
        sum / self.trees.len() as f64
    }
}

impl Predictor for ForestModel {
    fn features(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, PredictError> {
        check_width(matrix, &self.features)?;
        Ok(matrix.iter_rows().map(|row| self.predict_row(row)).collect())
    }
}

/// Ordinary linear regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// Feature names, in column order.
    pub features: Vec<String>,
    /// Bias term.
    pub intercept: f64,
    /// One weight per feature.
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    fn validate(&self) -> Result<(), PredictError> {
        if self.coefficients.len() != self.features.len() {
            return Err(malformed(format!(
                "{} coefficients for {} features",
                self.coefficients.len(),
                self.features.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(malformed("linear model has non-finite weights"));
        }
        Ok(())
    }
}

impl Predictor for LinearModel {
    fn features(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, PredictError> {
        check_width(matrix, &self.features)?;
        Ok(matrix
            .iter_rows()
            .map(|row| {
                self.intercept
                    + row
                        .iter()
                        .zip(&self.coefficients)
                        .map(|(x, w)| x * w)
                        .sum::<f64>()
            })
            .collect())
    }
}
