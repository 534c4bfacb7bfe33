//! Row-major feature matrix extracted from the location table.

use hotspot_map_dataset::{Dataset, DatasetError};

use crate::PredictError;

/// A dense `rows x columns` matrix of finite feature values.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureMatrix {
    /// Selects `columns` from every row of `dataset`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::MissingColumn`] if a column is absent from
    /// the table, [`PredictError::Dataset`] if a column holds text, and
    /// [`PredictError::MissingValue`] for the first missing cell.
    pub fn from_dataset(dataset: &Dataset, columns: &[String]) -> Result<Self, PredictError> {
        let selected = columns
            .iter()
            .map(|column| {
                dataset.column(column).map_err(|e| match e {
                    DatasetError::UnknownColumn(name) => PredictError::MissingColumn(name),
                    other => PredictError::Dataset(other),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut values = Vec::with_capacity(dataset.len() * columns.len());
        for (row, record) in dataset.records().iter().enumerate() {
            for (column, cells) in columns.iter().zip(&selected) {
                match cells.get(row).copied().flatten() {
                    Some(v) if v.is_finite() => values.push(v),
                    _ => {
                        return Err(PredictError::MissingValue {
                            row,
                            barangay: record.barangay.clone(),
                            column: column.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self {
            columns: columns.to_vec(),
            values,
        })
    }

    /// Builds a matrix from explicit rows.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::Shape`] if a row has the wrong width.
    pub fn from_rows(columns: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, PredictError> {
        let mut values = Vec::with_capacity(rows.len() * columns.len());
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(PredictError::Shape {
                    message: format!(
                        "row {idx} has {} values, expected {}",
                        row.len(),
                        columns.len()
                    ),
                });
            }
            values.extend_from_slice(row);
        }
        Ok(Self { columns, values })
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        if self.columns.is_empty() {
            0
        } else {
            self.values.len() / self.columns.len()
        }
    }

    /// Iterates over rows as slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.width().max(1))
    }
}
