#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! City-level geocoding for the crime dashboard map.
//!
//! Coordinates come from a fixed table embedded at compile time from
//! `cities.toml`. There is no network lookup: a city missing from the
//! table simply has no coordinates, and its incidents are left off the
//! heatmap.

use std::collections::BTreeMap;

use crime_dash_analytics_models::{CityAggregate, CityCount, HeatPoint};
use serde::Deserialize;
use thiserror::Error;

const CITIES_TOML: &str = include_str!("../cities.toml");

/// Errors loading a city table.
#[derive(Debug, Error)]
pub enum GeocoderError {
    /// The table is not valid TOML or has the wrong shape.
    #[error("Failed to parse city table: {0}")]
    Parse(#[from] toml::de::Error),

    /// A city appears more than once.
    #[error("Duplicate city in table: {0}")]
    Duplicate(String),

    /// A coordinate is outside the WGS84 range.
    #[error("Invalid coordinates for {city}: ({latitude}, {longitude})")]
    InvalidCoordinates {
        /// City name.
        city: String,
        /// Latitude as written.
        latitude: f64,
        /// Longitude as written.
        longitude: f64,
    },
}

/// Latitude/longitude pair (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct CityTableFile {
    #[serde(default)]
    city: Vec<CityEntry>,
}

#[derive(Debug, Deserialize)]
struct CityEntry {
    name: String,
    latitude: f64,
    longitude: f64,
}

/// Lookup table from exact city name to coordinates.
#[derive(Debug, Clone, Default)]
pub struct CityTable {
    cities: BTreeMap<String, Coordinates>,
}

impl CityTable {
    /// Loads the table embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded `cities.toml` is malformed.
    pub fn embedded() -> Result<Self, GeocoderError> {
        Self::from_toml(CITIES_TOML)
    }

    /// Parses a table from TOML with one `[[city]]` entry per city.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed, a city is listed twice,
    /// or a coordinate is out of range.
    pub fn from_toml(source: &str) -> Result<Self, GeocoderError> {
        let file: CityTableFile = toml::de::from_str(source)?;

        let mut cities = BTreeMap::new();
        for entry in file.city {
            if !(-90.0..=90.0).contains(&entry.latitude)
                || !(-180.0..=180.0).contains(&entry.longitude)
            {
                return Err(GeocoderError::InvalidCoordinates {
                    city: entry.name,
                    latitude: entry.latitude,
                    longitude: entry.longitude,
                });
            }
            let coordinates = Coordinates {
                latitude: entry.latitude,
                longitude: entry.longitude,
            };
            if cities.insert(entry.name.clone(), coordinates).is_some() {
                return Err(GeocoderError::Duplicate(entry.name));
            }
        }

        log::debug!("Loaded coordinates for {} cities", cities.len());

        Ok(Self { cities })
    }

    /// Number of cities in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Coordinates for `city`, matched exactly.
    #[must_use]
    pub fn lookup(&self, city: &str) -> Option<Coordinates> {
        self.cities.get(city).copied()
    }

    /// Attaches coordinates to per-city counts. Unknown cities keep their
    /// count with no coordinates.
    #[must_use]
    pub fn locate(&self, counts: Vec<CityCount>) -> Vec<CityAggregate> {
        counts
            .into_iter()
            .map(|CityCount { city, count }| {
                let coordinates = self.lookup(&city);
                if coordinates.is_none() {
                    log::trace!("No coordinates for city {city:?}");
                }
                CityAggregate {
                    city,
                    count,
                    latitude: coordinates.map(|c| c.latitude),
                    longitude: coordinates.map(|c| c.longitude),
                }
            })
            .collect()
    }
}

/// Heatmap points for every aggregate with both coordinates present.
#[must_use]
pub fn heat_points(aggregates: &[CityAggregate]) -> Vec<HeatPoint> {
    aggregates
        .iter()
        .filter_map(|a| {
            Some(HeatPoint {
                latitude: a.latitude?,
                longitude: a.longitude?,
                weight: a.count,
            })
        })
        .collect()
}
