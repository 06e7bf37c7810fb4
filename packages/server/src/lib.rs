#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web server for the crime dashboard.
//!
//! Serves the dashboard's JSON view models, the two prediction routes, and
//! the generated heatmap pages under `/static`. The dataset is loaded once
//! at startup and shared read-only between workers.

pub mod config;
mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use crime_dash_geocoder::CityTable;
use crime_dash_render::MapConfig;
use crime_dash_source::Dataset;

pub use config::{ConfigError, ServerConfig};

/// Shared application state.
pub struct AppState {
    /// The preprocessed incident dataset.
    pub dataset: Arc<Dataset>,
    /// City coordinate lookup.
    pub cities: Arc<CityTable>,
    /// Heatmap display settings.
    pub map_config: Arc<MapConfig>,
    /// Directory generated pages are written to.
    pub static_dir: PathBuf,
}

/// Registers the dashboard routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index_get))
        .route("/", web::post().to(handlers::index_post))
        .route("/update_map", web::post().to(handlers::update_map))
        .route("/hourly_map", web::post().to(handlers::hourly_map))
        .route("/predict_crime", web::post().to(handlers::predict_crime))
        .route(
            "/predict_city_crimes",
            web::post().to(handlers::predict_city_crimes),
        )
        .service(web::scope("/api").route("/health", web::get().to(handlers::health)));
}

/// Starts the dashboard server.
///
/// Loads the dataset and map settings named by `config`, then serves until
/// shut down. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an error if startup state cannot be loaded, or if the HTTP
/// server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let state = AppState::load(&config).map_err(std::io::Error::other)?;
    let static_dir = state.static_dir.clone();
    let state = web::Data::new(state);

    log::info!(
        "Starting server on {}:{} (static files from {})",
        config.bind_addr,
        config.port,
        static_dir.display()
    );

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
            // Serve generated map pages
            .service(Files::new("/static", static_dir.clone()))
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
