#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Leaflet map rendering and content-addressed map artifacts.
//!
//! A classification is turned into one colored circle marker per
//! location, embedded as a `GeoJSON` `FeatureCollection` in a standalone
//! HTML page. Pages are written under `<static>/maps/` with a file name
//! derived from the month and a SHA-256 of the page, so identical renders
//! share a file and different renders never overwrite each other.

pub mod artifact;
pub mod format;
pub mod page;

use hotspot_map_analysis_models::{Classification, ClassifiedLocation};
use hotspot_map_location_models::Coordinates;
use hotspot_map_severity_models::MarkerColor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use artifact::{MapArtifact, write_artifact, write_default_map};
pub use page::render_page;

/// Map center used for every render (Cagayan de Oro city proper).
pub const DEFAULT_CENTER: Coordinates = Coordinates::new(8.482, 124.647);
/// Initial zoom level.
pub const DEFAULT_ZOOM: u8 = 12;
/// Circle marker radius in pixels.
pub const MARKER_RADIUS: u32 = 8;
/// Circle marker fill opacity.
pub const MARKER_FILL_OPACITY: f64 = 0.7;

/// Errors from rendering and writing map artifacts.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Serializing the marker layer failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the artifact failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being written.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Initial viewport of a rendered map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    /// Map center.
    pub center: Coordinates,
    /// Zoom level.
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// One map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Marker position.
    pub coordinates: Coordinates,
    /// Stroke and fill color.
    pub color: MarkerColor,
    /// Plain popup text (escaped when rendered).
    pub popup: String,
}

/// Popup text for a classified location.
///
/// `"{barangay} - {label} ({density} kg/km²)"` when a density is known,
/// `"{barangay} - {label} (predicted)"` for class outputs.
#[must_use]
pub fn popup_text(location: &ClassifiedLocation) -> String {
    let label = location.label.map_or("Unknown", |l| l.display_name());
    match location.density {
        Some(density) => format!(
            "{} - {label} ({} kg/km²)",
            location.barangay,
            format::format_thousands(density, 1)
        ),
        None if location.label.is_some() => {
            format!("{} - {label} (predicted)", location.barangay)
        }
        None => format!("{} - {label} (no data)", location.barangay),
    }
}

/// Builds one marker per location, in table order.
#[must_use]
pub fn markers_for(classification: &Classification) -> Vec<Marker> {
    classification
        .locations
        .iter()
        .map(|location| Marker {
            coordinates: location.coordinates,
            color: MarkerColor::for_label(location.label),
            popup: popup_text(location),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotspot_map_analysis_models::ClassificationSource;
    use hotspot_map_severity_models::{Hotspot, Label, Severity};

    fn location(label: Option<Label>, density: Option<f64>) -> ClassifiedLocation {
        ClassifiedLocation {
            barangay: "A".to_string(),
            coordinates: Coordinates::new(8.48, 124.64),
            label,
            density,
        }
    }

    #[test]
    fn popup_with_density() {
        let loc = location(Some(Label::Severity(Severity::Low)), Some(2500.0));
        assert_eq!(popup_text(&loc), "A - Low (2,500.0 kg/km²)");
    }

    #[test]
    fn popup_for_flag_output() {
        let loc = location(Some(Label::Hotspot(Hotspot::Hotspot)), None);
        assert_eq!(popup_text(&loc), "A - HOTSPOT (predicted)");
    }

    #[test]
    fn popup_without_label() {
        assert_eq!(popup_text(&location(None, None)), "A - Unknown (no data)");
    }

    #[test]
    fn markers_follow_label_colors() {
        let classification = Classification {
            month: "June".to_string(),
            source: ClassificationSource::Thresholds,
            locations: vec![
                location(Some(Label::Severity(Severity::Low)), Some(10.0)),
                location(Some(Label::Severity(Severity::Moderate)), Some(3000.0)),
                location(Some(Label::Severity(Severity::Severe)), Some(4200.0)),
                location(None, None),
            ],
        };
        let colors: Vec<MarkerColor> = markers_for(&classification)
            .into_iter()
            .map(|m| m.color)
            .collect();
        assert_eq!(
            colors,
            vec![
                MarkerColor::Green,
                MarkerColor::Orange,
                MarkerColor::Red,
                MarkerColor::Gray
            ]
        );
    }
}
