#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the hotspot map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the analysis types to allow independent evolution of the API
//! contract.

use hotspot_map_analysis_models::{
    Classification, ClassificationSource, ClassifiedLocation, MonthDefinition,
};
use hotspot_map_severity_models::MarkerColor;
use serde::{Deserialize, Serialize};

/// Form body of `POST /`.
#[derive(Debug, Clone, Deserialize)]
pub struct MonthForm {
    /// Selected month name.
    pub month: String,
}

/// Query parameters for `GET /api/hotspots`.
#[derive(Debug, Clone, Deserialize)]
pub struct HotspotQueryParams {
    /// Month name.
    pub month: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always `true` when the server can answer.
    pub healthy: bool,
    /// Crate version.
    pub version: String,
}

/// A selectable month.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMonth {
    /// Month name.
    pub name: String,
    /// Selector position.
    pub order: u32,
    /// Whether labels come from the model.
    pub predicted: bool,
}

impl From<&MonthDefinition> for ApiMonth {
    fn from(month: &MonthDefinition) -> Self {
        Self {
            name: month.name.clone(),
            order: month.order,
            predicted: month.is_predicted(),
        }
    }
}

/// A labeled location as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHotspot {
    /// Barangay name.
    pub barangay: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Label display name, if labeled.
    pub label: Option<String>,
    /// Marker color.
    pub color: MarkerColor,
    /// Density behind the label, when known.
    pub density: Option<f64>,
}

impl From<&ClassifiedLocation> for ApiHotspot {
    fn from(location: &ClassifiedLocation) -> Self {
        Self {
            barangay: location.barangay.clone(),
            latitude: location.coordinates.latitude,
            longitude: location.coordinates.longitude,
            label: location.label.map(|l| l.display_name().to_string()),
            color: MarkerColor::for_label(location.label),
            density: location.density,
        }
    }
}

/// All labeled locations for one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHotspots {
    /// Month name.
    pub month: String,
    /// Label origin.
    pub source: ClassificationSource,
    /// One entry per location.
    pub locations: Vec<ApiHotspot>,
}

impl From<&Classification> for ApiHotspots {
    fn from(classification: &Classification) -> Self {
        Self {
            month: classification.month.clone(),
            source: classification.source,
            locations: classification
                .locations
                .iter()
                .map(ApiHotspot::from)
                .collect(),
        }
    }
}

/// Error body returned by API routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}
