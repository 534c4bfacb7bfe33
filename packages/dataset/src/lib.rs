#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location table loading and column access.
//!
//! The table is read once at startup from a CSV file with one row per
//! barangay. Identity columns are required and numeric. Every other column
//! is kept by header name: numeric columns are read as `f64`, while a
//! column holding any non-numeric cell is kept as text and only fails when
//! something asks for its values. Empty cells, `NaN`, infinities, and the
//! usual NA markers are all stored as missing. The loaded [`Dataset`] is
//! immutable: derived values are computed elsewhere and never written back
//! into it.

pub mod paths;

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use hotspot_map_location_models::{
    BARANGAY_COLUMN, Coordinates, IDENTITY_COLUMNS, LAND_AREA_COLUMN, LATITUDE_COLUMN,
    LONGITUDE_COLUMN, LocationRecord, POPULATION_COLUMN,
};
use thiserror::Error;

/// Errors that can occur while loading or reading the location table.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The CSV file could not be opened or a row could not be read.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Path (or `<reader>`) of the table.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// A required identity column is missing from the header.
    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    /// A numeric cell could not be parsed, either in an identity column
    /// at load time or in a text column whose values were requested.
    #[error("Row {row} ({barangay}): column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        /// 1-based data row number.
        row: usize,
        /// Barangay of the offending row.
        barangay: String,
        /// Column name.
        column: String,
        /// Raw cell value.
        value: String,
    },

    /// A required cell (name or coordinate) is missing.
    #[error("Row {row}: required column '{column}' is empty or not finite")]
    EmptyRequired {
        /// 1-based data row number.
        row: usize,
        /// Column name.
        column: String,
    },

    /// A requested column does not exist in the table.
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
}

/// Cell values read as missing, besides the empty string.
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a",
    "nan", "null",
];

/// First non-numeric cell of a text column.
#[derive(Debug, Clone, PartialEq)]
struct TextCell {
    row: usize,
    barangay: String,
    value: String,
}

/// The immutable location table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<LocationRecord>,
    text_columns: BTreeMap<String, TextCell>,
}

impl Dataset {
    /// Loads the location table from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file cannot be read, a required
    /// column is missing, or a cell is malformed.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let label = path.display().to_string();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DatasetError::Csv {
                path: label.clone(),
                source: e,
            })?;

        let dataset = Self::from_csv(reader, &label)?;
        log::info!(
            "Loaded {} locations with {} columns from {label}",
            dataset.len(),
            dataset.columns.len()
        );
        Ok(dataset)
    }

    /// Loads the location table from any reader producing CSV text.
    ///
    /// # Errors
    ///
    /// Same as [`Dataset::load`].
    pub fn from_reader(reader: impl Read) -> Result<Self, DatasetError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::from_csv(reader, "<reader>")
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>, label: &str) -> Result<Self, DatasetError> {
        let csv_err = |e: csv::Error| DatasetError::Csv {
            path: label.to_string(),
            source: e,
        };

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(ToString::to_string)
            .collect();

        for required in IDENTITY_COLUMNS {
            if !headers.iter().any(|h| h == required) {
                return Err(DatasetError::MissingColumn((*required).to_string()));
            }
        }

        let mut records = Vec::new();
        let mut text_columns: BTreeMap<String, TextCell> = BTreeMap::new();
        for (idx, result) in reader.records().enumerate() {
            let row = idx + 1;
            let raw = result.map_err(csv_err)?;
            let (record, text) = parse_row(row, &headers, &raw)?;
            for (column, value) in text {
                text_columns.entry(column).or_insert_with(|| TextCell {
                    row,
                    barangay: record.barangay.clone(),
                    value,
                });
            }
            records.push(record);
        }

        for record in &mut records {
            record
                .measures
                .retain(|name, _| !text_columns.contains_key(name));
        }
        for (column, cell) in &text_columns {
            log::debug!(
                "Column '{column}' is not numeric (row {}: '{}'), keeping it as text",
                cell.row,
                cell.value
            );
        }

        Ok(Self {
            columns: headers,
            records,
            text_columns,
        })
    }

    /// Returns all records in file order.
    #[must_use]
    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }

    /// Returns the column names in header order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns `true` if the table has a column with this name.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Number of locations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns one value per row for a numeric column.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownColumn`] if no such column exists and
    /// [`DatasetError::InvalidNumber`] naming the first offending cell if
    /// the column holds text.
    pub fn column(&self, name: &str) -> Result<Vec<Option<f64>>, DatasetError> {
        if name == BARANGAY_COLUMN || !self.has_column(name) {
            return Err(DatasetError::UnknownColumn(name.to_string()));
        }
        if let Some(cell) = self.text_columns.get(name) {
            return Err(DatasetError::InvalidNumber {
                row: cell.row,
                barangay: cell.barangay.clone(),
                column: name.to_string(),
                value: cell.value.clone(),
            });
        }
        Ok(self
            .records
            .iter()
            .map(|r| r.value(name).flatten())
            .collect())
    }
}

enum Cell {
    Number(Option<f64>),
    Text,
}

/// Empty, NA-marked, and non-finite cells are missing.
fn parse_cell(value: &str) -> Cell {
    if value.is_empty() || MISSING_MARKERS.contains(&value) {
        return Cell::Number(None);
    }
    value.parse::<f64>().map_or(Cell::Text, |v| {
        Cell::Number(Some(v).filter(|v| v.is_finite()))
    })
}

/// Parses one data row. Also returns the `(column, value)` pairs of
/// non-numeric cells outside the identity columns.
fn parse_row(
    row: usize,
    headers: &[String],
    raw: &csv::StringRecord,
) -> Result<(LocationRecord, Vec<(String, String)>), DatasetError> {
    let barangay = headers
        .iter()
        .zip(raw.iter())
        .find(|(header, _)| *header == BARANGAY_COLUMN)
        .map(|(_, value)| value.to_string())
        .filter(|b| !b.is_empty())
        .ok_or_else(|| DatasetError::EmptyRequired {
            row,
            column: BARANGAY_COLUMN.to_string(),
        })?;

    let mut cells: BTreeMap<&str, Option<f64>> = BTreeMap::new();
    let mut text = Vec::new();

    for (header, value) in headers.iter().zip(raw.iter()) {
        if header == BARANGAY_COLUMN {
            continue;
        }
        match parse_cell(value) {
            Cell::Number(parsed) => {
                cells.insert(header.as_str(), parsed);
            }
            Cell::Text if IDENTITY_COLUMNS.contains(&header.as_str()) => {
                return Err(DatasetError::InvalidNumber {
                    row,
                    barangay,
                    column: header.clone(),
                    value: value.to_string(),
                });
            }
            Cell::Text => text.push((header.clone(), value.to_string())),
        }
    }

    let mut take_required = |column: &str| {
        cells
            .remove(column)
            .flatten()
            .ok_or_else(|| DatasetError::EmptyRequired {
                row,
                column: column.to_string(),
            })
    };
    let latitude = take_required(LATITUDE_COLUMN)?;
    let longitude = take_required(LONGITUDE_COLUMN)?;

    let population = cells.remove(POPULATION_COLUMN).flatten();
    let land_area_km2 = cells.remove(LAND_AREA_COLUMN).flatten();

    let measures = cells
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    let record = LocationRecord {
        barangay,
        coordinates: Coordinates::new(latitude, longitude),
        population,
        land_area_km2,
        measures,
    };
    Ok((record, text))
}
