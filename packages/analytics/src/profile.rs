//! Per-city "likely crime" profile.
//!
//! A frequency summary over every incident recorded for a city, ignoring
//! dashboard filters.

use crime_dash_analytics_models::{CityPrediction, CityProfile};
use crime_dash_crime_models::{Confidence, CrimeSeverity, Incident};
use crime_dash_source::Dataset;

/// Entries reported per ranked list.
pub const TOP_N: usize = 3;

/// Attached to every profile.
pub const PROFILE_DISCLAIMER: &str =
    "Frequency summary of historical records for this city; not a calibrated prediction.";

/// Profiles the incidents recorded for `city`.
///
/// The name is matched exactly after trimming surrounding whitespace. A
/// blank name, or a city without incidents, yields
/// [`CityPrediction::NoData`].
#[must_use]
pub fn profile_city(dataset: &Dataset, city: &str) -> CityPrediction {
    let city = city.trim();
    let incidents: Vec<&Incident> = if city.is_empty() {
        Vec::new()
    } else {
        dataset
            .incidents()
            .iter()
            .filter(|i| i.city.as_deref() == Some(city))
            .collect()
    };

    if incidents.is_empty() {
        log::debug!("No incidents recorded for city {city:?}");
        return CityPrediction::no_data(city);
    }

    let mean_police_deployed = mean(incidents.iter().filter_map(|i| i.police_deployed));
    let record_count = incidents.len();

    CityPrediction::Profile(CityProfile {
        city: city.to_string(),
        likely_crimes: top_values(incidents.iter().filter_map(|i| i.crime_description.as_deref())),
        likely_domains: top_values(incidents.iter().filter_map(|i| i.crime_domain.as_deref())),
        predicted_severity: CrimeSeverity::from_mean(mean_police_deployed),
        confidence: Confidence::from_record_count(record_count),
        record_count,
        mean_police_deployed,
        disclaimer: PROFILE_DISCLAIMER.to_string(),
    })
}

/// The [`TOP_N`] most frequent values, most frequent first. Equal counts
/// keep the order in which the values first appeared.
fn top_values<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(TOP_N)
        .map(|(value, _)| value.to_string())
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0_usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
