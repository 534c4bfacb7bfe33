//! Standalone Leaflet HTML page.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

use crate::format::escape_html;
use crate::{MARKER_FILL_OPACITY, MARKER_RADIUS, MapView, Marker, RenderError};

const LEAFLET_VERSION: &str = "1.9.4";

/// Converts markers to a `GeoJSON` point layer.
///
/// Each feature carries `color` and an HTML-escaped `popup` property.
#[must_use]
pub fn marker_layer(markers: &[Marker]) -> FeatureCollection {
    let features = markers
        .iter()
        .map(|marker| {
            let mut properties = JsonObject::new();
            properties.insert(
                "color".to_string(),
                serde_json::Value::String(marker.color.to_string()),
            );
            properties.insert(
                "popup".to_string(),
                serde_json::Value::String(escape_html(&marker.popup)),
            );
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![
                    marker.coordinates.longitude,
                    marker.coordinates.latitude,
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Renders a self-contained map page.
///
/// # Errors
///
/// Returns [`RenderError::Json`] if the marker layer cannot be serialized.
pub fn render_page(view: &MapView, markers: &[Marker], title: &str) -> Result<String, RenderError> {
    let layer = serde_json::to_string(&marker_layer(markers))?;
    // `</script>` inside the JSON would end the script element early.
    let layer = layer.replace("</", "<\\/");
    let title = escape_html(title);
    let lat = view.center.latitude;
    let lng = view.center.longitude;
    let zoom = view.zoom;

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.js"></script>
<style>html, body, #map {{ width: 100%; height: 100%; margin: 0; padding: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map").setView([{lat}, {lng}], {zoom});
L.tileLayer("https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
  maxZoom: 19,
  attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
var markers = {layer};
L.geoJSON(markers, {{
  pointToLayer: function (feature, latlng) {{
    return L.circleMarker(latlng, {{
      radius: {MARKER_RADIUS},
      color: feature.properties.color,
      fillColor: feature.properties.color,
      fill: true,
      fillOpacity: {MARKER_FILL_OPACITY}
    }});
  }},
  onEachFeature: function (feature, layer) {{
    layer.bindPopup(feature.properties.popup);
  }}
}}).addTo(map);
</script>
</body>
</html>
"#
    ))
}
