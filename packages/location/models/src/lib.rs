#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Barangay location record types.
//!
//! A barangay is the smallest administrative unit and the row key of the
//! location table. Identity columns (name, coordinates, population, land
//! area) are reference data; per-month density columns are kept by name so
//! new months only need a new CSV column.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// CSV column holding the barangay name.
pub const BARANGAY_COLUMN: &str = "barangay";
/// CSV column holding the latitude (WGS84).
pub const LATITUDE_COLUMN: &str = "latitude";
/// CSV column holding the longitude (WGS84).
pub const LONGITUDE_COLUMN: &str = "longitude";
/// CSV column holding the resident population.
pub const POPULATION_COLUMN: &str = "population";
/// CSV column holding the land area in square kilometres.
pub const LAND_AREA_COLUMN: &str = "land_area_km2";

/// All identity columns that every location table must carry.
pub const IDENTITY_COLUMNS: &[&str] = &[
    BARANGAY_COLUMN,
    LATITUDE_COLUMN,
    LONGITUDE_COLUMN,
    POPULATION_COLUMN,
    LAND_AREA_COLUMN,
];

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a new coordinate pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One row of the location table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    /// Barangay name.
    pub barangay: String,
    /// Barangay centroid.
    pub coordinates: Coordinates,
    /// Resident population. `None` when the cell was empty.
    pub population: Option<f64>,
    /// Land area in km². `None` when the cell was empty.
    pub land_area_km2: Option<f64>,
    /// Remaining numeric columns keyed by CSV header (e.g. `jun_density`).
    /// Empty cells are stored as `None`.
    pub measures: BTreeMap<String, Option<f64>>,
}

impl LocationRecord {
    /// Looks up a numeric column by name, including the identity columns.
    ///
    /// Returns `None` if the column does not exist, and `Some(None)` if it
    /// exists but the cell is empty.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<Option<f64>> {
        match column {
            LATITUDE_COLUMN => Some(Some(self.coordinates.latitude)),
            LONGITUDE_COLUMN => Some(Some(self.coordinates.longitude)),
            POPULATION_COLUMN => Some(self.population),
            LAND_AREA_COLUMN => Some(self.land_area_km2),
            other => self.measures.get(other).copied(),
        }
    }
}
