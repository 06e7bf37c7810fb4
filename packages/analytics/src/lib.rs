#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query engine behind the dashboard.
//!
//! Filters narrow the loaded [`crime_dash_source::Dataset`] into views,
//! aggregations summarize a view for the map and charts, and the forecast
//! and profile modules answer the two prediction routes. Everything here is
//! synchronous and operates on borrowed data.

pub mod aggregate;
pub mod arima;
pub mod filter;
pub mod forecast;
pub mod profile;

pub use aggregate::{
    aggregate_by_city, aggregate_by_city_domain, aggregate_by_hour, daily_series,
    severity_breakdown,
};
pub use arima::ForecastError;
pub use filter::apply_filters;
pub use forecast::{forecast_daily, forecast_dataset};
pub use profile::profile_city;
