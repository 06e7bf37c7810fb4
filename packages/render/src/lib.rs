#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Artifacts served by the dashboard: Leaflet heatmap pages written to the
//! static directory and the inline forecast chart.

pub mod chart;
pub mod heatmap;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAP_TOML: &str = include_str!("../map.toml");

/// Errors that can occur while rendering an artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Map configuration could not be parsed.
    #[error("Invalid map configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Point data could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Chart drawing failed.
    #[error("Chart error: {0}")]
    Chart(String),

    /// PNG encoding failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Display settings for the heatmap pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Initial map centre latitude.
    pub center_latitude: f64,
    /// Initial map centre longitude.
    pub center_longitude: f64,
    /// Initial zoom level.
    pub zoom: u8,
    /// Heat point radius in pixels.
    pub radius: u32,
    /// Heat point blur in pixels.
    pub blur: u32,
    /// Tile layer URL template.
    pub tile_url: String,
    /// Tile layer attribution HTML.
    pub attribution: String,
}

/// A partial [`MapConfig`]; present fields replace the defaults.
#[derive(Debug, Default, Deserialize)]
struct MapConfigOverride {
    center_latitude: Option<f64>,
    center_longitude: Option<f64>,
    zoom: Option<u8>,
    radius: Option<u32>,
    blur: Option<u32>,
    tile_url: Option<String>,
    attribution: Option<String>,
}

impl MapConfig {
    /// The defaults embedded from `map.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded file is malformed.
    pub fn embedded() -> Result<Self, RenderError> {
        Ok(toml::de::from_str(MAP_TOML)?)
    }

    /// The embedded defaults with fields from `path` applied on top.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let source = std::fs::read_to_string(path)?;
        let config = Self::embedded()?.with_overrides(&source)?;
        log::info!("Loaded map configuration from {}", path.display());
        Ok(config)
    }

    /// Applies the fields present in the TOML document `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if `source` is not valid TOML or a field has the
    /// wrong type.
    pub fn with_overrides(mut self, source: &str) -> Result<Self, RenderError> {
        let overrides: MapConfigOverride = toml::de::from_str(source)?;

        if let Some(v) = overrides.center_latitude {
            self.center_latitude = v;
        }
        if let Some(v) = overrides.center_longitude {
            self.center_longitude = v;
        }
        if let Some(v) = overrides.zoom {
            self.zoom = v;
        }
        if let Some(v) = overrides.radius {
            self.radius = v;
        }
        if let Some(v) = overrides.blur {
            self.blur = v;
        }
        if let Some(v) = overrides.tile_url {
            self.tile_url = v;
        }
        if let Some(v) = overrides.attribution {
            self.attribution = v;
        }

        Ok(self)
    }
}

/// Writes `contents` to `path` through a uniquely named temporary file in
/// the same directory, so readers never observe a partial file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be written or renamed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), RenderError> {
    let file_name = path
        .file_name()
        .map_or_else(|| "artifact".into(), |n| n.to_string_lossy());
    let tmp_path = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    std::fs::write(&tmp_path, contents)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    log::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("crime_dash_render_{name}_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults() {
        let config = MapConfig::embedded().unwrap();
        assert_eq!(config.radius, 25);
        assert_eq!(config.blur, 20);
        assert_eq!(config.zoom, 5);
    }

    #[test]
    fn overrides_replace_only_present_fields() {
        let config = MapConfig::embedded()
            .unwrap()
            .with_overrides("zoom = 7\nradius = 30\n")
            .unwrap();
        assert_eq!(config.zoom, 7);
        assert_eq!(config.radius, 30);
        assert_eq!(config.blur, 20);

        assert!(
            MapConfig::embedded()
                .unwrap()
                .with_overrides("zoom = \"close\"")
                .is_err()
        );
    }

    #[test]
    fn load_reads_override_file() {
        let dir = test_dir("config");
        let path = dir.join("map.toml");
        std::fs::write(&path, "blur = 5\n").unwrap();

        let config = MapConfig::load(&path).unwrap();
        assert_eq!(config.blur, 5);
        assert!(MapConfig::load(&dir.join("missing.toml")).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn atomic_write_replaces_and_leaves_no_temp_files() {
        let dir = test_dir("atomic");
        let path = dir.join("map.html");

        write_atomic(&path, "first").unwrap();
        write_atomic(&path, "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        let entries = std::fs::read_dir(&dir).unwrap().count();
        assert_eq!(entries, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
