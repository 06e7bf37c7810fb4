#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Request and response types for the crime dashboard server.
//!
//! Forms are form-encoded with `snake_case` field names; every field is
//! optional and anything unrecognized means "All". Responses are the JSON
//! view models a page template would render, with `camelCase` keys.

use crime_dash_analytics_models::{
    ALL, CityAggregate, CityDomainCount, CityPrediction, FilterParams, ForecastOutcome,
    ForecastPoint, SeverityCount, TimeRange,
};
use crime_dash_crime_models::VictimGender;
use serde::{Deserialize, Serialize};

/// Dashboard filter selections as submitted by the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterForm {
    /// Time-range preset label.
    pub time_range: Option<String>,
    /// `M`, `F`, or `All`.
    pub gender: Option<String>,
    /// Crime domain or `All`.
    pub domain: Option<String>,
    /// City or `All`.
    pub city: Option<String>,
}

impl FilterForm {
    /// Parses the selections into filter parameters.
    #[must_use]
    pub fn params(&self) -> FilterParams {
        FilterParams::from_selections(
            self.time_range.as_deref(),
            self.gender.as_deref(),
            self.domain.as_deref(),
            self.city.as_deref(),
        )
    }
}

/// City selection for the profile route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CityForm {
    /// City to profile.
    pub city: Option<String>,
}

/// The selections echoed back to the page, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selections {
    /// Time-range label.
    pub time_range: String,
    /// Gender code or `All`.
    pub gender: String,
    /// Crime domain or `All`.
    pub domain: String,
    /// Selected city, if any.
    pub city: Option<String>,
}

impl Selections {
    /// Selections with every filter at `All` and the given city.
    #[must_use]
    pub fn unfiltered(city: Option<String>) -> Self {
        Self {
            time_range: TimeRange::All.to_string(),
            gender: ALL.to_string(),
            domain: ALL.to_string(),
            city,
        }
    }
}

impl From<&FilterParams> for Selections {
    fn from(params: &FilterParams) -> Self {
        Self {
            time_range: params.time_range.to_string(),
            gender: params
                .gender
                .map_or_else(|| ALL.to_string(), |g| g.to_string()),
            domain: params.domain.clone().unwrap_or_else(|| ALL.to_string()),
            city: params.city.clone(),
        }
    }
}

/// Choices offered by the dashboard's selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Time-range labels, `All` first.
    pub time_ranges: Vec<String>,
    /// Gender choices, `All` first.
    pub genders: Vec<String>,
    /// Crime domains, `All` first, then sorted.
    pub domains: Vec<String>,
    /// Cities, sorted.
    pub cities: Vec<String>,
}

impl FilterOptions {
    /// Builds the options from the dataset's distinct domains and cities.
    #[must_use]
    pub fn new(domains: &[String], cities: &[String]) -> Self {
        Self {
            time_ranges: TimeRange::labels(),
            genders: [ALL.to_string()]
                .into_iter()
                .chain(
                    [VictimGender::Male, VictimGender::Female]
                        .iter()
                        .map(ToString::to_string),
                )
                .collect(),
            domains: std::iter::once(ALL.to_string())
                .chain(domains.iter().cloned())
                .collect(),
            cities: cities.to_vec(),
        }
    }
}

/// Response for `/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Echoed selections.
    pub selections: Selections,
    /// Selector choices.
    pub options: FilterOptions,
    /// Incidents in the filtered view.
    pub record_count: usize,
    /// Distinct cities in the filtered view.
    pub city_count: usize,
    /// Per-city counts with coordinates.
    pub cities: Vec<CityAggregate>,
    /// Incidents per city and crime domain.
    pub domains: Vec<CityDomainCount>,
    /// Incidents per severity bucket.
    pub severity: Vec<SeverityCount>,
    /// URL of the rendered heatmap.
    pub map_url: String,
}

/// Response for `/update_map` and `/hourly_map`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMapResponse {
    /// Cache-busted URL of the rendered heatmap.
    pub map_url: String,
    /// Incidents in the filtered view.
    pub record_count: usize,
    /// Distinct cities in the filtered view.
    pub city_count: usize,
}

/// Response for `/predict_crime`.
///
/// The forecast always covers the whole dataset; `filters_applied` is
/// `false` and the selections are only echoed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastView {
    /// Echoed selections.
    pub selections: Selections,
    /// Selector choices.
    pub options: FilterOptions,
    /// Whether the selections affected the forecast.
    pub filters_applied: bool,
    /// Seven forecast days.
    pub forecast: Vec<ForecastPoint>,
    /// How the forecast was produced.
    pub outcome: ForecastOutcome,
    /// Distinct historical dates the forecast was based on.
    pub history_days: usize,
    /// Base64 PNG chart of history and forecast, absent if rendering failed.
    pub chart_png_base64: Option<String>,
    /// Incidents in the dataset.
    pub record_count: usize,
    /// Distinct cities in the dataset.
    pub city_count: usize,
}

/// Response for `/predict_city_crimes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityPredictionView {
    /// Echoed selections; only the city is set.
    pub selections: Selections,
    /// Selector choices.
    pub options: FilterOptions,
    /// The profile, or a no-data result.
    pub prediction: CityPrediction,
    /// Incidents in the dataset.
    pub record_count: usize,
    /// Distinct cities in the dataset.
    pub city_count: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version string.
    pub version: String,
}
