//! Server configuration and startup state.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use crime_dash_geocoder::{CityTable, GeocoderError};
use crime_dash_render::{MapConfig, RenderError};
use crime_dash_source::{SourceError, load_dataset};
use thiserror::Error;

use crate::AppState;

/// Errors preparing the server before it starts listening.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The incident dataset could not be loaded.
    #[error("Failed to load dataset from {}: {source}", path.display())]
    Dataset {
        /// Dataset path.
        path: PathBuf,
        /// Underlying error.
        source: SourceError,
    },

    /// The city coordinate table is invalid.
    #[error(transparent)]
    Cities(#[from] GeocoderError),

    /// The map configuration could not be loaded.
    #[error(transparent)]
    Map(#[from] RenderError),

    /// The static directory could not be created.
    #[error("Failed to create static directory {}: {source}", path.display())]
    StaticDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Serve the crime dashboard.
#[derive(Debug, Clone, Parser)]
#[command(name = "crime_dash_server")]
#[command(about = "Serve the crime heatmap and forecast dashboard")]
pub struct ServerConfig {
    /// Path to the incident CSV.
    #[arg(long, env = "DATA_PATH", default_value = "data/crime_dataset_india.csv")]
    pub data_path: PathBuf,

    /// Directory generated map pages are written to and served from.
    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Address to bind.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1")]
    pub bind_addr: String,

    /// Port to bind.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// TOML file overriding the map display defaults.
    #[arg(long, env = "MAP_CONFIG")]
    pub map_config: Option<PathBuf>,
}

impl AppState {
    /// Loads the dataset, lookup tables, and map settings named by
    /// `config`, creating the static directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if any input cannot be loaded or the static
    /// directory cannot be created.
    pub fn load(config: &ServerConfig) -> Result<Self, ConfigError> {
        log::info!("Loading dataset from {}...", config.data_path.display());
        let dataset = load_dataset(&config.data_path).map_err(|source| ConfigError::Dataset {
            path: config.data_path.clone(),
            source,
        })?;

        let cities = CityTable::embedded()?;

        let map_config = match &config.map_config {
            Some(path) => MapConfig::load(path)?,
            None => MapConfig::embedded()?,
        };

        std::fs::create_dir_all(&config.static_dir).map_err(|source| ConfigError::StaticDir {
            path: config.static_dir.clone(),
            source,
        })?;

        Ok(Self {
            dataset: Arc::new(dataset),
            cities: Arc::new(cities),
            map_config: Arc::new(map_config),
            static_dir: config.static_dir.clone(),
        })
    }
}
