#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime incident record types, severity buckets, and confidence labels.
//!
//! This crate defines the row shape of the crime dataset as read from CSV
//! ([`IncidentRecord`]), the preprocessed in-memory form used by every
//! query ([`Incident`]), and the coarse labels attached to city profiles
//! ([`CrimeSeverity`], [`Confidence`]).

use chrono::{Datelike as _, NaiveDate, NaiveDateTime, Timelike as _};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Mean police deployment at or above which a city is bucketed as
/// [`CrimeSeverity::High`].
pub const HIGH_SEVERITY_MIN_DEPLOYED: f64 = 13.0;

/// Mean police deployment at or above which a city is bucketed as
/// [`CrimeSeverity::Medium`].
pub const MEDIUM_SEVERITY_MIN_DEPLOYED: f64 = 6.0;

/// Record count a city must exceed for a [`Confidence::High`] profile.
pub const HIGH_CONFIDENCE_MIN_RECORDS: usize = 50;

/// Victim gender as recorded in the dataset.
///
/// Only `M` and `F` are recognized; every other value (including blanks)
/// collapses into [`VictimGender::Other`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum VictimGender {
    /// Male victim.
    #[serde(rename = "M")]
    #[strum(serialize = "M")]
    Male,
    /// Female victim.
    #[serde(rename = "F")]
    #[strum(serialize = "F")]
    Female,
    /// Any other or missing value.
    Other,
}

impl VictimGender {
    /// Parses a gender filter value. Returns `None` for anything other than
    /// `M` or `F`, which callers treat as "no filter".
    #[must_use]
    pub fn parse_filter(value: &str) -> Option<Self> {
        match value.trim() {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            _ => None,
        }
    }

    /// Maps a raw dataset cell to a gender.
    #[must_use]
    pub fn from_raw(value: Option<&str>) -> Self {
        value.and_then(Self::parse_filter).unwrap_or(Self::Other)
    }
}

/// Coarse severity bucket derived from the number of police deployed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum CrimeSeverity {
    /// Fewer than 6 officers deployed on average.
    Low,
    /// Between 6 and 13 officers, or an unmeasured deployment.
    Medium,
    /// 13 or more officers deployed on average.
    High,
}

impl CrimeSeverity {
    /// Buckets a police deployment count.
    ///
    /// `NaN` is treated as unmeasured and bucketed as [`Self::Medium`].
    /// Infinities compare like any other number, so `inf` is
    /// [`Self::High`] and `-inf` is [`Self::Low`].
    #[must_use]
    pub fn from_police_count(count: f64) -> Self {
        if count.is_nan() {
            Self::Medium
        } else if count >= HIGH_SEVERITY_MIN_DEPLOYED {
            Self::High
        } else if count >= MEDIUM_SEVERITY_MIN_DEPLOYED {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Buckets a mean deployment that may be missing (every input value was
    /// non-numeric). A missing mean is bucketed as [`Self::Medium`].
    #[must_use]
    pub fn from_mean(mean: Option<f64>) -> Self {
        mean.map_or(Self::Medium, Self::from_police_count)
    }

    /// Buckets a raw `Police Deployed` cell. Values that do not parse as a
    /// number fall back to [`Self::Medium`]; `"inf"` parses and is
    /// [`Self::High`].
    #[must_use]
    pub fn from_police_deployed(raw: &str) -> Self {
        raw.trim()
            .parse::<f64>()
            .map_or(Self::Medium, Self::from_police_count)
    }

    /// Returns all variants of this enum, lowest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High]
    }
}

/// How much weight a city profile deserves, based purely on sample size.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Confidence {
    /// At most [`HIGH_CONFIDENCE_MIN_RECORDS`] records back the profile.
    Medium,
    /// More than [`HIGH_CONFIDENCE_MIN_RECORDS`] records back the profile.
    High,
}

impl Confidence {
    /// Labels a profile built from `count` records.
    #[must_use]
    pub const fn from_record_count(count: usize) -> Self {
        if count > HIGH_CONFIDENCE_MIN_RECORDS {
            Self::High
        } else {
            Self::Medium
        }
    }
}

/// One raw row of the crime dataset as it appears in the CSV file.
///
/// Every field is optional: absent columns and empty cells both
/// deserialize to `None`. Columns not listed here are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// City where the incident occurred.
    #[serde(rename = "City", default)]
    pub city: Option<String>,
    /// Victim gender (`M`, `F`, or anything else).
    #[serde(rename = "Victim Gender", default)]
    pub victim_gender: Option<String>,
    /// Crime domain category (e.g. "Violent Crime").
    #[serde(rename = "Crime Domain", default)]
    pub crime_domain: Option<String>,
    /// Free-text crime description (e.g. "BURGLARY").
    #[serde(rename = "Crime Description", default)]
    pub crime_description: Option<String>,
    /// Number of police deployed, as written in the file.
    #[serde(rename = "Police Deployed", default)]
    pub police_deployed: Option<String>,
    /// Raw timestamp of the incident.
    #[serde(rename = "Time of Occurrence", default)]
    pub time_of_occurrence: Option<String>,
}

/// A preprocessed crime incident.
///
/// Calendar fields (`hour`, `date`, `weekday`) are derived once from
/// `occurred_at` at construction time and are `None` whenever the raw
/// timestamp could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// City name, trimmed of surrounding whitespace. `None` when the cell
    /// was missing or blank; such incidents belong to no city.
    pub city: Option<String>,
    /// Victim gender.
    pub victim_gender: VictimGender,
    /// Crime domain, if recorded.
    pub crime_domain: Option<String>,
    /// Crime description, if recorded.
    pub crime_description: Option<String>,
    /// Police deployed, if numeric.
    pub police_deployed: Option<f64>,
    /// Raw timestamp string as read from the dataset.
    pub time_of_occurrence: String,
    /// Parsed timestamp.
    pub occurred_at: Option<NaiveDateTime>,
    /// Hour of day (0-23).
    pub hour: Option<u32>,
    /// Calendar date.
    pub date: Option<NaiveDate>,
    /// Day of week, Monday = 0.
    pub weekday: Option<u32>,
}

impl Incident {
    /// Creates an incident for `city` with the derived calendar fields
    /// filled in from `occurred_at`.
    ///
    /// The city is trimmed; a blank name leaves the incident without a city.
    ///
    /// All other attributes start out missing; use the `with_*` methods to
    /// set them.
    #[must_use]
    pub fn new(city: impl Into<String>, occurred_at: Option<NaiveDateTime>) -> Self {
        let city = city.into();
        let city = city.trim();

        Self {
            city: (!city.is_empty()).then(|| city.to_string()),
            victim_gender: VictimGender::Other,
            crime_domain: None,
            crime_description: None,
            police_deployed: None,
            time_of_occurrence: occurred_at.map(|dt| dt.to_string()).unwrap_or_default(),
            occurred_at,
            hour: occurred_at.map(|dt| dt.hour()),
            date: occurred_at.map(|dt| dt.date()),
            weekday: occurred_at.map(|dt| dt.weekday().num_days_from_monday()),
        }
    }

    /// Sets the victim gender.
    #[must_use]
    pub const fn with_gender(mut self, gender: VictimGender) -> Self {
        self.victim_gender = gender;
        self
    }

    /// Sets the crime domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.crime_domain = Some(domain.into());
        self
    }

    /// Sets the crime description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.crime_description = Some(description.into());
        self
    }

    /// Sets the police deployment count.
    #[must_use]
    pub const fn with_police_deployed(mut self, police: Option<f64>) -> Self {
        self.police_deployed = police;
        self
    }

    /// Overrides the raw timestamp string kept for display.
    #[must_use]
    pub fn with_raw_time(mut self, raw: impl Into<String>) -> Self {
        self.time_of_occurrence = raw.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_bucket_boundaries() {
        assert_eq!(CrimeSeverity::from_police_count(13.0), CrimeSeverity::High);
        assert_eq!(CrimeSeverity::from_police_count(6.0), CrimeSeverity::Medium);
        assert_eq!(CrimeSeverity::from_police_count(5.0), CrimeSeverity::Low);
        assert_eq!(CrimeSeverity::from_police_count(12.99), CrimeSeverity::Medium);
    }

    #[test]
    fn severity_from_unparseable_input_is_medium() {
        assert_eq!(
            CrimeSeverity::from_police_deployed("not-a-number"),
            CrimeSeverity::Medium
        );
        assert_eq!(CrimeSeverity::from_police_deployed(""), CrimeSeverity::Medium);
        assert_eq!(CrimeSeverity::from_police_deployed("NaN"), CrimeSeverity::Medium);
        assert_eq!(CrimeSeverity::from_police_deployed(" 13 "), CrimeSeverity::High);
        assert_eq!(CrimeSeverity::from_mean(None), CrimeSeverity::Medium);
    }

    #[test]
    fn infinite_deployment_compares_as_a_number() {
        assert_eq!(CrimeSeverity::from_police_deployed("inf"), CrimeSeverity::High);
        assert_eq!(CrimeSeverity::from_police_deployed("-inf"), CrimeSeverity::Low);
        assert_eq!(CrimeSeverity::from_police_count(f64::NAN), CrimeSeverity::Medium);
    }

    #[test]
    fn confidence_threshold_is_strict() {
        assert_eq!(Confidence::from_record_count(51), Confidence::High);
        assert_eq!(Confidence::from_record_count(50), Confidence::Medium);
        assert_eq!(Confidence::from_record_count(0), Confidence::Medium);
    }

    #[test]
    fn gender_filter_only_recognizes_m_and_f() {
        assert_eq!(VictimGender::parse_filter("M"), Some(VictimGender::Male));
        assert_eq!(VictimGender::parse_filter("F"), Some(VictimGender::Female));
        assert_eq!(VictimGender::parse_filter("All"), None);
        assert_eq!(VictimGender::parse_filter("X"), None);
        assert_eq!(VictimGender::from_raw(Some("X")), VictimGender::Other);
        assert_eq!(VictimGender::from_raw(None), VictimGender::Other);
        assert_eq!(VictimGender::Male.to_string(), "M");
    }

    #[test]
    fn incident_derives_calendar_fields() {
        let dt = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(22, 15, 0)
            .unwrap();
        let incident = Incident::new("Delhi", Some(dt));
        assert_eq!(incident.hour, Some(22));
        assert_eq!(incident.date, NaiveDate::from_ymd_opt(2020, 1, 1));
        // 2020-01-01 was a Wednesday
        assert_eq!(incident.weekday, Some(2));

        let unparsed = Incident::new("Delhi", None);
        assert_eq!(unparsed.hour, None);
        assert_eq!(unparsed.date, None);
        assert_eq!(unparsed.weekday, None);
    }
}
