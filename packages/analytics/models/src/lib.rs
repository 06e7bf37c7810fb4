#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter, aggregate, forecast, and city profile types for crime analytics.
//!
//! These are the inputs and outputs of the query functions in
//! `crime_dash_analytics`. They carry no behavior beyond parsing user
//! selections and small predicates, so the server models and renderers can
//! depend on them without pulling in the analytics engine.

use chrono::NaiveDate;
use crime_dash_crime_models::{Confidence, CrimeSeverity, VictimGender};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The selection value that disables a filter.
pub const ALL: &str = "All";

/// Number of days the forecast always covers.
pub const FORECAST_HORIZON_DAYS: usize = 7;

/// An hour-of-day window, `[start_hour, end_hour)`.
///
/// When `start_hour >= end_hour` the window wraps past midnight and
/// matches hours `>= start_hour` or `< end_hour`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    /// First hour included (0-23).
    pub start_hour: u32,
    /// First hour excluded (0-24).
    pub end_hour: u32,
}

impl TimeWindow {
    /// Creates a window.
    #[must_use]
    pub const fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// Whether the window wraps past midnight.
    #[must_use]
    pub const fn wraps_midnight(self) -> bool {
        self.start_hour >= self.end_hour
    }

    /// Whether an hour falls inside the window. An absent hour never does.
    #[must_use]
    pub const fn contains(self, hour: Option<u32>) -> bool {
        let Some(hour) = hour else {
            return false;
        };
        if self.wraps_midnight() {
            hour >= self.start_hour || hour < self.end_hour
        } else {
            hour >= self.start_hour && hour < self.end_hour
        }
    }
}

/// Named time-of-day presets offered by the dashboard.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum TimeRange {
    /// No time filtering.
    #[default]
    #[strum(serialize = "All")]
    All,
    /// 05:00 to 12:00.
    #[strum(serialize = "Morning (05–12)")]
    Morning,
    /// 12:00 to 17:00.
    #[strum(serialize = "Afternoon (12–17)")]
    Afternoon,
    /// 17:00 to 22:00.
    #[strum(serialize = "Evening (17–22)")]
    Evening,
    /// 22:00 to 05:00.
    #[strum(serialize = "Night (22–05)")]
    Night,
    /// 22:00 to 02:00.
    #[strum(serialize = "Late Night (22–02)")]
    LateNight,
}

impl TimeRange {
    /// Parses a preset label. Unknown labels fall back to [`Self::All`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        label.trim().parse().unwrap_or_default()
    }

    /// The hour window for this preset, or `None` for [`Self::All`].
    #[must_use]
    pub const fn window(self) -> Option<TimeWindow> {
        match self {
            Self::All => None,
            Self::Morning => Some(TimeWindow::new(5, 12)),
            Self::Afternoon => Some(TimeWindow::new(12, 17)),
            Self::Evening => Some(TimeWindow::new(17, 22)),
            Self::Night => Some(TimeWindow::new(22, 5)),
            Self::LateNight => Some(TimeWindow::new(22, 2)),
        }
    }

    /// Returns all presets in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::All,
            Self::Morning,
            Self::Afternoon,
            Self::Evening,
            Self::Night,
            Self::LateNight,
        ]
    }

    /// Display labels for all presets, in order.
    #[must_use]
    pub fn labels() -> Vec<String> {
        Self::all().iter().map(ToString::to_string).collect()
    }
}

/// The active set of filters, parsed from user selections.
///
/// `None` (and [`TimeRange::All`]) means "do not filter on this field".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterParams {
    /// Time-of-day preset.
    pub time_range: TimeRange,
    /// Victim gender.
    pub gender: Option<VictimGender>,
    /// Crime domain, matched exactly.
    pub domain: Option<String>,
    /// City, matched exactly.
    pub city: Option<String>,
}

impl FilterParams {
    /// Parses raw selection strings. Missing, blank, `"All"`, and
    /// unrecognized values all disable the corresponding filter.
    #[must_use]
    pub fn from_selections(
        time_range: Option<&str>,
        gender: Option<&str>,
        domain: Option<&str>,
        city: Option<&str>,
    ) -> Self {
        Self {
            time_range: time_range.map(TimeRange::from_label).unwrap_or_default(),
            gender: gender.and_then(VictimGender::parse_filter),
            domain: selection(domain),
            city: selection(city),
        }
    }

    /// Returns a copy with the city filter removed.
    #[must_use]
    pub fn without_city(&self) -> Self {
        Self {
            city: None,
            ..self.clone()
        }
    }

    /// Whether no filter is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time_range.window().is_none()
            && self.gender.is_none()
            && self.domain.is_none()
            && self.city.is_none()
    }
}

fn selection(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ALL)
        .map(str::to_string)
}

/// Number of incidents in one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityCount {
    /// City name.
    pub city: String,
    /// Number of incidents.
    pub count: u64,
}

/// A city count with its coordinates, if the city is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityAggregate {
    /// City name.
    pub city: String,
    /// Number of incidents.
    pub count: u64,
    /// Latitude (WGS84).
    pub latitude: Option<f64>,
    /// Longitude (WGS84).
    pub longitude: Option<f64>,
}

/// A weighted heatmap point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Point weight; the incident count for the city.
    pub weight: u64,
}

/// Number of incidents for a city and crime domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityDomainCount {
    /// City name.
    pub city: String,
    /// Crime domain.
    pub domain: String,
    /// Number of incidents.
    pub count: u64,
}

/// City counts for incidents that occurred in one hour of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyCityCounts {
    /// Hour of day (0-23).
    pub hour: u32,
    /// Per-city counts for that hour.
    pub cities: Vec<CityCount>,
}

/// Number of incidents per severity bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityCount {
    /// Severity bucket.
    pub severity: CrimeSeverity,
    /// Number of incidents.
    pub count: u64,
}

/// A point in the daily incident series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    /// Calendar date.
    pub date: NaiveDate,
    /// Incidents on that date.
    pub count: u64,
}

/// One forecast day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    /// Forecast date.
    pub date: NaiveDate,
    /// Predicted incident count.
    pub count: u64,
}

/// Order of a fitted ARIMA model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// Autoregressive order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// Moving-average order.
    pub q: usize,
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// Why the forecast fell back to the flat historical average.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FallbackReason {
    /// No history at all.
    EmptySeries,
    /// Too few distinct dates to fit a model.
    #[serde(rename_all = "camelCase")]
    InsufficientHistory {
        /// Distinct dates available.
        observations: usize,
        /// Distinct dates required.
        required: usize,
    },
    /// Model fitting or extrapolation failed.
    FitFailed {
        /// What went wrong.
        message: String,
    },
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySeries => write!(f, "no history"),
            Self::InsufficientHistory {
                observations,
                required,
            } => write!(f, "{observations} days of history, {required} required"),
            Self::FitFailed { message } => write!(f, "model fit failed: {message}"),
        }
    }
}

/// How the forecast numbers were produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ForecastOutcome {
    /// An automatically selected model was fitted and extrapolated.
    Fitted {
        /// Selected model order.
        order: ArimaOrder,
        /// Akaike information criterion of the selected model.
        aic: f64,
    },
    /// The flat historical average was used.
    Fallback {
        /// Why the model was not used.
        reason: FallbackReason,
    },
}

impl ForecastOutcome {
    /// Whether a model was fitted.
    #[must_use]
    pub const fn is_fitted(&self) -> bool {
        matches!(self, Self::Fitted { .. })
    }
}

/// A seven-day incident forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    /// Exactly [`FORECAST_HORIZON_DAYS`] consecutive days.
    pub points: Vec<ForecastPoint>,
    /// Which branch produced the numbers.
    pub outcome: ForecastOutcome,
}

impl Forecast {
    /// The predicted counts, in date order.
    #[must_use]
    pub fn counts(&self) -> Vec<u64> {
        self.points.iter().map(|p| p.count).collect()
    }
}

/// Heuristic summary of what crime is most likely in a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityProfile {
    /// City name.
    pub city: String,
    /// Up to three most frequent crime descriptions.
    pub likely_crimes: Vec<String>,
    /// Up to three most frequent crime domains.
    pub likely_domains: Vec<String>,
    /// Severity bucket from the mean police deployment.
    pub predicted_severity: CrimeSeverity,
    /// Confidence label from the record count.
    pub confidence: Confidence,
    /// Number of incidents the profile was built from.
    pub record_count: usize,
    /// Mean police deployed over numeric values, if any.
    pub mean_police_deployed: Option<f64>,
    /// Reminder that this is a frequency summary, not a calibrated model.
    pub disclaimer: String,
}

/// Result of profiling a city: a profile, or an explicit "no data" answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CityPrediction {
    /// The city has incidents.
    Profile(CityProfile),
    /// The city has no incidents.
    NoData {
        /// Requested city.
        city: String,
        /// Message for display.
        error: String,
    },
}

impl CityPrediction {
    /// Builds the "no data" result for `city`.
    #[must_use]
    pub fn no_data(city: &str) -> Self {
        Self::NoData {
            city: city.to_string(),
            error: format!("No data for {city}"),
        }
    }
}
