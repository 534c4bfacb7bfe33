//! The month selector page.

use hotspot_map_analysis_models::MonthDefinition;
use hotspot_map_render::format::escape_html;

/// What the page should show.
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    /// Registered months for the selector.
    pub months: &'a [MonthDefinition],
    /// Selected month, or `None` on first load.
    pub selected: Option<&'a str>,
    /// Map path relative to the static directory.
    pub map_path: &'a str,
    /// Error to show above the map.
    pub error: Option<&'a str>,
}

/// Renders the index page.
#[must_use]
pub fn render_index(view: &PageView<'_>) -> String {
    let options: String = view
        .months
        .iter()
        .map(|month| {
            let name = escape_html(&month.name);
            let selected = if view
                .selected
                .is_some_and(|s| s.eq_ignore_ascii_case(&month.name))
            {
                " selected"
            } else {
                ""
            };
            let suffix = if month.is_predicted() {
                " (predicted)"
            } else {
                ""
            };
            format!("<option value=\"{name}\"{selected}>{name}{suffix}</option>\n")
        })
        .collect();

    let selected = escape_html(view.selected.unwrap_or("None"));
    let error = view
        .error
        .map(|e| format!("<p class=\"error\">{}</p>\n", escape_html(e)))
        .unwrap_or_default();
    let map_path = escape_html(view.map_path);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Barangay Hotspot Map</title>
<style>
body {{ font-family: sans-serif; margin: 1rem; }}
iframe {{ width: 100%; height: 75vh; border: 1px solid #ccc; }}
.error {{ color: #b00020; }}
</style>
</head>
<body>
<h1>Barangay Hotspot Map</h1>
<form method="post" action="/">
<label for="month">Month</label>
<select id="month" name="month">
{options}</select>
<button type="submit">Show</button>
</form>
<p>Selected month: <strong>{selected}</strong></p>
{error}<iframe src="/static/{map_path}" title="Hotspot map"></iframe>
</body>
</html>
"#
    )
}
