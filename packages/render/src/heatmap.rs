//! Leaflet heatmap pages.
//!
//! Each page is self-contained HTML that loads Leaflet and `Leaflet.heat`
//! from a CDN and embeds its points as JSON `[lat, lon, weight]` triples.

use std::path::{Path, PathBuf};

use crime_dash_analytics_models::HeatPoint;

use crate::{MapConfig, RenderError, write_atomic};

/// File name of the filtered heatmap in the static directory.
pub const HEATMAP_FILE: &str = "map.html";

/// File name of the hourly heatmap in the static directory.
pub const HOURLY_HEATMAP_FILE: &str = "map_hourly.html";

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const LEAFLET_HEAT_JS: &str = "https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js";

/// Writes the heatmap for `points` to [`HEATMAP_FILE`] in `static_dir`,
/// replacing any previous one. Returns the path written.
///
/// # Errors
///
/// Returns an error if the page cannot be written.
pub fn render_heatmap(
    points: &[HeatPoint],
    config: &MapConfig,
    static_dir: &Path,
) -> Result<PathBuf, RenderError> {
    let html = heatmap_html(points, config)?;
    let path = static_dir.join(HEATMAP_FILE);
    write_atomic(&path, &html)?;
    log::debug!("Rendered heatmap with {} points", points.len());
    Ok(path)
}

/// Writes a heatmap with one frame per hour and a slider to
/// [`HOURLY_HEATMAP_FILE`] in `static_dir`. Returns the path written.
///
/// `frames` pairs each hour with its points; hours are shown in the order
/// given.
///
/// # Errors
///
/// Returns an error if the page cannot be written.
pub fn render_hourly_heatmap(
    frames: &[(u32, Vec<HeatPoint>)],
    config: &MapConfig,
    static_dir: &Path,
) -> Result<PathBuf, RenderError> {
    let html = hourly_heatmap_html(frames, config)?;
    let path = static_dir.join(HOURLY_HEATMAP_FILE);
    write_atomic(&path, &html)?;
    log::debug!("Rendered hourly heatmap with {} frames", frames.len());
    Ok(path)
}

/// Builds the heatmap page.
///
/// # Errors
///
/// Returns an error if the points cannot be serialized.
pub fn heatmap_html(points: &[HeatPoint], config: &MapConfig) -> Result<String, RenderError> {
    let data = serde_json::to_string(&triples(points))?;
    let script = format!(
        "var points = {data};\n\
         L.heatLayer(points, {options}).addTo(map);",
        options = heat_options(config, max_weight(points)),
    );
    Ok(page("Crime heatmap", config, "", &script))
}

/// Builds the hourly heatmap page.
///
/// # Errors
///
/// Returns an error if the frames cannot be serialized.
pub fn hourly_heatmap_html(
    frames: &[(u32, Vec<HeatPoint>)],
    config: &MapConfig,
) -> Result<String, RenderError> {
    let labels: Vec<String> = frames.iter().map(|(hour, _)| format!("{hour}:00")).collect();
    let data: Vec<Vec<[f64; 3]>> = frames.iter().map(|(_, points)| triples(points)).collect();
    let max = frames
        .iter()
        .map(|(_, points)| max_weight(points))
        .max()
        .unwrap_or(1);
    let last = frames.len().saturating_sub(1);

    let controls = format!(
        "<div id=\"controls\">\
         <input id=\"hour\" type=\"range\" min=\"0\" max=\"{last}\" step=\"1\" value=\"0\">\
         <span id=\"label\"></span></div>"
    );
    let script = format!(
        "var frames = {frames};\n\
         var labels = {labels};\n\
         var layer = L.heatLayer([], {options}).addTo(map);\n\
         var slider = document.getElementById('hour');\n\
         function show(i) {{\n\
         \x20 layer.setLatLngs(frames[i] || []);\n\
         \x20 document.getElementById('label').textContent = labels[i] || '';\n\
         }}\n\
         slider.addEventListener('input', function () {{ show(Number(slider.value)); }});\n\
         show(0);",
        frames = serde_json::to_string(&data)?,
        labels = serde_json::to_string(&labels)?,
        options = heat_options(config, max),
    );
    Ok(page("Crime heatmap by hour", config, &controls, &script))
}

#[allow(clippy::cast_precision_loss)]
fn triples(points: &[HeatPoint]) -> Vec<[f64; 3]> {
    points
        .iter()
        .map(|p| [p.latitude, p.longitude, p.weight as f64])
        .collect()
}

fn max_weight(points: &[HeatPoint]) -> u64 {
    points.iter().map(|p| p.weight).max().unwrap_or(1).max(1)
}

fn heat_options(config: &MapConfig, max: u64) -> String {
    format!(
        "{{radius: {radius}, blur: {blur}, max: {max}}}",
        radius = config.radius,
        blur = config.blur,
    )
}

fn page(title: &str, config: &MapConfig, controls: &str, script: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="{LEAFLET_CSS}">
<style>
html, body {{ height: 100%; margin: 0; }}
#map {{ height: 100%; }}
#controls {{ position: absolute; bottom: 16px; left: 16px; z-index: 1000; background: #fff; padding: 6px 10px; border-radius: 4px; font-family: sans-serif; }}
</style>
</head>
<body>
<div id="map"></div>
{controls}
<script src="{LEAFLET_JS}"></script>
<script src="{LEAFLET_HEAT_JS}"></script>
<script>
var map = L.map('map').setView([{lat}, {lon}], {zoom});
L.tileLayer({tile_url}, {{attribution: {attribution}}}).addTo(map);
{script}
</script>
</body>
</html>
"#,
        lat = config.center_latitude,
        lon = config.center_longitude,
        zoom = config.zoom,
        tile_url = js_string(&config.tile_url),
        attribution = js_string(&config.attribution),
    )
}

/// A JSON string literal that is also safe inside a `<script>` element.
fn js_string(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_dir;

    fn point(latitude: f64, longitude: f64, weight: u64) -> HeatPoint {
        HeatPoint {
            latitude,
            longitude,
            weight,
        }
    }

    #[test]
    fn page_embeds_points_and_display_settings() {
        let config = MapConfig::embedded().unwrap();
        let html = heatmap_html(&[point(28.7, 77.1, 12), point(18.5, 73.8, 3)], &config).unwrap();

        assert!(html.contains("[[28.7,77.1,12.0],[18.5,73.8,3.0]]"));
        assert!(html.contains("{radius: 25, blur: 20, max: 12}"));
        assert!(html.contains("setView([22.9734, 78.6569], 5)"));
        assert!(html.contains(LEAFLET_HEAT_JS));
    }

    #[test]
    fn empty_heatmap_is_still_a_page() {
        let config = MapConfig::embedded().unwrap();
        let html = heatmap_html(&[], &config).unwrap();
        assert!(html.contains("var points = [];"));
        assert!(html.contains("max: 1}"));
    }

    #[test]
    fn attribution_cannot_close_the_script() {
        let config = MapConfig {
            attribution: "</script><b>x</b>".to_string(),
            ..MapConfig::embedded().unwrap()
        };
        let html = heatmap_html(&[], &config).unwrap();
        assert_eq!(html.matches("</script>").count(), 3);
    }

    #[test]
    fn render_overwrites_the_artifact() {
        let dir = test_dir("heatmap");
        let config = MapConfig::embedded().unwrap();

        let path = render_heatmap(&[point(1.0, 2.0, 3)], &config, &dir).unwrap();
        assert_eq!(path, dir.join(HEATMAP_FILE));
        render_heatmap(&[point(4.0, 5.0, 6)], &config, &dir).unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("[[4.0,5.0,6.0]]"));
        assert!(!html.contains("[[1.0,2.0,3.0]]"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn hourly_page_has_a_frame_per_hour() {
        let dir = test_dir("hourly");
        let config = MapConfig::embedded().unwrap();
        let frames: Vec<(u32, Vec<HeatPoint>)> = (0..24)
            .map(|hour| {
                let points = if hour == 23 {
                    vec![point(1.0, 2.0, 9)]
                } else {
                    Vec::new()
                };
                (hour, points)
            })
            .collect();

        let path = render_hourly_heatmap(&frames, &config, &dir).unwrap();
        assert_eq!(path, dir.join(HOURLY_HEATMAP_FILE));

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("max=\"23\""));
        assert!(html.contains("\"0:00\""));
        assert!(html.contains("\"23:00\""));
        assert!(html.contains("[[1.0,2.0,9.0]]"));
        assert!(html.contains("max: 9}"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
