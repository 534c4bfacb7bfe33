//! Classify, render, and write one month's map.

use std::path::Path;
use std::sync::Arc;

use hotspot_map_analysis::HotspotAnalyzer;
use hotspot_map_analysis_models::Classification;
use hotspot_map_render::{MapArtifact, MapView, Marker};

use crate::ServerError;

/// Result of rendering one month.
#[derive(Debug, Clone)]
pub struct RenderedMonth {
    /// Canonical month name.
    pub month: String,
    /// Labels the map was drawn from.
    pub classification: Arc<Classification>,
    /// Markers drawn on the map.
    pub markers: Vec<Marker>,
    /// Written page.
    pub artifact: MapArtifact,
}

/// Labels `month`, renders its map page, and writes it under `static_dir`.
///
/// Any failure discards the render; no partial page is written.
///
/// # Errors
///
/// Returns [`ServerError::BadRequest`] for unknown months,
/// [`ServerError::Inference`] if labeling fails, and
/// [`ServerError::Render`] if the page cannot be written.
pub fn render_month(
    analyzer: &HotspotAnalyzer,
    static_dir: &Path,
    view: &MapView,
    month: &str,
) -> Result<RenderedMonth, ServerError> {
    let classification = analyzer.classify(month)?;
    let markers = hotspot_map_render::markers_for(&classification);
    let html = hotspot_map_render::render_page(view, &markers, &classification.month)?;
    let artifact = hotspot_map_render::write_artifact(static_dir, &classification.month, &html)?;

    Ok(RenderedMonth {
        month: classification.month.clone(),
        classification,
        markers,
        artifact,
    })
}
