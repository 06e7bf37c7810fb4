//! Group-and-count aggregations over incident views.
//!
//! Groups only contain keys present in the view; a city with no matching
//! incidents is absent rather than reported with a zero count, and
//! incidents without a city are left out of every per-city group.

use std::collections::BTreeMap;

use crime_dash_analytics_models::{
    CityCount, CityDomainCount, DailyPoint, HourlyCityCounts, SeverityCount,
};
use crime_dash_crime_models::{CrimeSeverity, Incident};

/// Counts incidents per city, ordered by city name.
#[must_use]
pub fn aggregate_by_city(view: &[&Incident]) -> Vec<CityCount> {
    count_cities(view.iter().copied())
}

/// Counts incidents per (city, crime domain) pair, ordered by city then
/// domain. Incidents without a domain are not counted.
#[must_use]
pub fn aggregate_by_city_domain(view: &[&Incident]) -> Vec<CityDomainCount> {
    let mut counts: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for incident in view {
        if let (Some(city), Some(domain)) =
            (incident.city.as_deref(), incident.crime_domain.as_deref())
        {
            *counts.entry((city, domain)).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .map(|((city, domain), count)| CityDomainCount {
            city: city.to_string(),
            domain: domain.to_string(),
            count,
        })
        .collect()
}

/// Counts incidents per city for each hour of the day.
///
/// Always returns 24 frames (hours 0-23); hours without incidents have no
/// cities. Incidents without an hour are skipped.
#[must_use]
pub fn aggregate_by_hour(view: &[&Incident]) -> Vec<HourlyCityCounts> {
    (0..24)
        .map(|hour| HourlyCityCounts {
            hour,
            cities: count_cities(view.iter().copied().filter(|i| i.hour == Some(hour))),
        })
        .collect()
}

/// Counts incidents per severity bucket of their police deployment.
///
/// Every bucket is present, lowest first.
#[must_use]
pub fn severity_breakdown(view: &[&Incident]) -> Vec<SeverityCount> {
    let mut counts: BTreeMap<CrimeSeverity, u64> = CrimeSeverity::all()
        .iter()
        .map(|severity| (*severity, 0))
        .collect();
    for incident in view {
        *counts
            .entry(CrimeSeverity::from_mean(incident.police_deployed))
            .or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(severity, count)| SeverityCount { severity, count })
        .collect()
}

/// Counts incidents per calendar date.
///
/// The result has one point per distinct date, strictly increasing.
/// Incidents without a date are skipped.
#[must_use]
pub fn daily_series(view: &[&Incident]) -> Vec<DailyPoint> {
    let mut counts = BTreeMap::new();
    for date in view.iter().filter_map(|i| i.date) {
        *counts.entry(date).or_insert(0_u64) += 1;
    }

    counts
        .into_iter()
        .map(|(date, count)| DailyPoint { date, count })
        .collect()
}

fn count_cities<'a>(incidents: impl Iterator<Item = &'a Incident>) -> Vec<CityCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for city in incidents.filter_map(|i| i.city.as_deref()) {
        *counts.entry(city).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(city, count)| CityCount {
            city: city.to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn incident(city: &str, day: u32, hour: u32) -> Incident {
        let dt = NaiveDate::from_ymd_opt(2021, 3, day)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap();
        Incident::new(city, Some(dt))
    }

    #[test]
    fn counts_per_city_sorted_by_name() {
        let incidents = [
            incident("Pune", 1, 1),
            incident("Delhi", 1, 2),
            incident("Pune", 2, 3),
        ];
        let view: Vec<&Incident> = incidents.iter().collect();

        let counts = aggregate_by_city(&view);
        assert_eq!(
            counts,
            vec![
                CityCount {
                    city: "Delhi".to_string(),
                    count: 1
                },
                CityCount {
                    city: "Pune".to_string(),
                    count: 2
                },
            ]
        );
        assert!(aggregate_by_city(&[]).is_empty());
    }

    #[test]
    fn counts_per_city_and_domain() {
        let incidents = [
            incident("Pune", 1, 1).with_domain("Violent Crime"),
            incident("Pune", 1, 1).with_domain("Violent Crime"),
            incident("Pune", 1, 1).with_domain("Fire Accident"),
            incident("Delhi", 1, 1),
        ];
        let view: Vec<&Incident> = incidents.iter().collect();

        let counts = aggregate_by_city_domain(&view);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].domain, "Fire Accident");
        assert_eq!(counts[1].domain, "Violent Crime");
        assert_eq!(counts[1].count, 2);
    }

    #[test]
    fn hourly_frames_cover_the_whole_day() {
        let incidents = [
            incident("Pune", 1, 0),
            incident("Pune", 1, 23),
            incident("Delhi", 2, 23),
            Incident::new("Delhi", None),
        ];
        let view: Vec<&Incident> = incidents.iter().collect();

        let frames = aggregate_by_hour(&view);
        assert_eq!(frames.len(), 24);
        assert_eq!(frames[0].cities.len(), 1);
        assert_eq!(frames[23].cities.len(), 2);
        assert!(frames[12].cities.is_empty());
        let total: u64 = frames
            .iter()
            .flat_map(|f| f.cities.iter().map(|c| c.count))
            .sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn incidents_without_city_are_left_out_of_city_groups() {
        let incidents = [
            incident("", 1, 5).with_domain("Violent Crime"),
            incident("Delhi", 1, 5).with_domain("Violent Crime"),
        ];
        let view: Vec<&Incident> = incidents.iter().collect();

        let by_city = aggregate_by_city(&view);
        assert_eq!(by_city.len(), 1);
        assert_eq!(by_city[0].city, "Delhi");

        let by_domain = aggregate_by_city_domain(&view);
        assert_eq!(by_domain.len(), 1);
        assert_eq!(by_domain[0].city, "Delhi");

        assert_eq!(aggregate_by_hour(&view)[5].cities.len(), 1);
        assert_eq!(daily_series(&view)[0].count, 2);
    }

    #[test]
    fn severity_breakdown_buckets_each_incident() {
        let incidents = [
            incident("Pune", 1, 1).with_police_deployed(Some(15.0)),
            incident("Pune", 1, 1).with_police_deployed(Some(2.0)),
            incident("Pune", 1, 1).with_police_deployed(None),
        ];
        let view: Vec<&Incident> = incidents.iter().collect();

        let counts: Vec<u64> = severity_breakdown(&view).iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![1, 1, 1]);
    }

    #[test]
    fn daily_series_is_strictly_increasing() {
        let incidents = [
            incident("Pune", 3, 1),
            incident("Pune", 1, 1),
            incident("Delhi", 3, 5),
            Incident::new("Delhi", None),
        ];
        let view: Vec<&Incident> = incidents.iter().collect();

        let series = daily_series(&view);
        assert_eq!(series.len(), 2);
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(series[1].count, 2);
    }
}
