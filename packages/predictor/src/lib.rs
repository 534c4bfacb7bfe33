#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pre-fitted model loading and vectorized inference.
//!
//! Models are exported from the training environment to JSON and loaded
//! once at startup. Inference always runs over the whole location table
//! at once: the feature columns are pulled out of the [`Dataset`] into a
//! row-major [`FeatureMatrix`], and the model returns one value per row.
//!
//! Missing or non-finite features are rejected before the model is
//! called. There is no imputation.

pub mod features;
pub mod model;

use std::fmt::Debug;
use std::path::Path;

use hotspot_map_dataset::{Dataset, DatasetError};
use thiserror::Error;

pub use features::FeatureMatrix;
pub use model::{ForestModel, LinearModel, ModelFile, Tree, TreeNode};

/// Feature columns used by the shipped December model, in order.
pub const DEFAULT_FEATURES: &[&str] = &[
    "population",
    "land_area_km2",
    "latitude",
    "longitude",
    "aug_density",
    "sep_density",
    "oct_density",
];

/// Errors from model loading and inference.
#[derive(Debug, Error)]
pub enum PredictError {
    /// The model file could not be read.
    #[error("I/O error reading model {path}: {source}")]
    Io {
        /// Model path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The model file is not valid JSON for any supported model kind.
    #[error("Invalid model file: {0}")]
    Json(#[from] serde_json::Error),

    /// The model's structure is inconsistent (bad child index, wrong
    /// coefficient count, empty forest).
    #[error("Malformed model: {message}")]
    Malformed {
        /// Description of the inconsistency.
        message: String,
    },

    /// The model was trained on different features than requested.
    #[error("Model expects features {expected:?}, configured features are {actual:?}")]
    FeatureMismatch {
        /// Features the model was exported with.
        expected: Vec<String>,
        /// Features the caller asked for.
        actual: Vec<String>,
    },

    /// A feature column does not exist in the table.
    #[error("Feature column '{0}' is not in the location table")]
    MissingColumn(String),

    /// A feature cell is empty, `NaN`, or infinite.
    #[error("Row {row} ({barangay}): feature '{column}' is missing or not finite")]
    MissingValue {
        /// 0-based row index.
        row: usize,
        /// Barangay of the offending row.
        barangay: String,
        /// Feature column.
        column: String,
    },

    /// A feature column holds text.
    #[error("Feature column is not numeric: {0}")]
    Dataset(#[from] DatasetError),

    /// The model produced `NaN` or an infinity.
    #[error("Row {row} ({barangay}): model output {value} is not finite")]
    NonFiniteOutput {
        /// 0-based row index.
        row: usize,
        /// Barangay of the offending row.
        barangay: String,
        /// The output value.
        value: f64,
    },

    /// Matrix or output shape does not match the model.
    #[error("Shape mismatch: {message}")]
    Shape {
        /// Description of the mismatch.
        message: String,
    },
}

/// A fitted model that maps feature rows to scalar outputs.
pub trait Predictor: Debug + Send + Sync {
    /// Feature column names, in the order the model expects them.
    fn features(&self) -> &[String];

    /// Predicts one value per row of `matrix`.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError`] if the matrix does not fit the model.
    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, PredictError>;
}

/// Loads an exported model from a JSON file.
///
/// # Errors
///
/// Returns [`PredictError`] if the file cannot be read, does not parse,
/// or describes an inconsistent model.
pub fn load_model(path: &Path) -> Result<Box<dyn Predictor>, PredictError> {
    let content = std::fs::read_to_string(path).map_err(|e| PredictError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let model = ModelFile::from_json(&content)?;
    log::info!(
        "Loaded {} model from {} ({} features)",
        model.kind_name(),
        path.display(),
        model.features().len()
    );
    Ok(model.into_predictor())
}

/// Checks that a model was trained on exactly the configured features.
///
/// # Errors
///
/// Returns [`PredictError::FeatureMismatch`] otherwise.
pub fn ensure_features(predictor: &dyn Predictor, expected: &[String]) -> Result<(), PredictError> {
    if predictor.features() == expected {
        Ok(())
    } else {
        Err(PredictError::FeatureMismatch {
            expected: predictor.features().to_vec(),
            actual: expected.to_vec(),
        })
    }
}

/// Runs the model over every row of the dataset.
///
/// Builds the feature matrix from the model's own feature list, invokes
/// the model once, and checks that exactly one output per row came back.
///
/// # Errors
///
/// Returns [`PredictError`] if a feature is missing or non-finite, or the
/// model output does not match the row count.
pub fn predict_dataset(
    predictor: &dyn Predictor,
    dataset: &Dataset,
) -> Result<Vec<f64>, PredictError> {
    let matrix = FeatureMatrix::from_dataset(dataset, predictor.features())?;
    let output = predictor.predict(&matrix)?;
    if output.len() != matrix.rows() {
        return Err(PredictError::Shape {
            message: format!(
                "model returned {} outputs for {} rows",
                output.len(),
                matrix.rows()
            ),
        });
    }
    if let Some((row, value)) = output.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(PredictError::NonFiniteOutput {
            row,
            barangay: dataset.records()[row].barangay.clone(),
            value: *value,
        });
    }
    log::debug!("Predicted {} rows", output.len());
    Ok(output)
}
