//! Shared parsing utilities for raw dataset cells.
//!
//! Timestamp and numeric parsing used while preprocessing incident rows.
//! Nothing here fails: unparseable input maps to `None`.

use chrono::{NaiveDate, NaiveDateTime};

/// Timestamp formats tried in order. Day-first formats come before ISO
/// ones so that `01-02-2020` is read as 1 February.
const DATETIME_FORMATS: &[&str] = &[
    "%d-%m-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Date-only formats, interpreted as midnight.
const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];

/// Parses a `Time of Occurrence` cell (day-first).
///
/// Returns `None` for blank or unrecognized input.
#[must_use]
pub fn parse_occurrence_time(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses a `Police Deployed` cell. Non-numeric and non-finite values
/// return `None`.
#[must_use]
pub fn parse_police_deployed(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
