//! Row preprocessing: raw [`IncidentRecord`] to [`Incident`].
//!
//! Parses the timestamp and police count, and
//! derives the calendar fields. Runs once per row at load time.

use crime_dash_crime_models::{Incident, IncidentRecord, VictimGender};

use crate::parsing::{parse_occurrence_time, parse_police_deployed};

/// Converts one raw dataset row into a preprocessed incident.
#[must_use]
pub fn preprocess(record: IncidentRecord) -> Incident {
    let raw_time = record.time_of_occurrence.unwrap_or_default();
    let occurred_at = parse_occurrence_time(&raw_time);

    let mut incident = Incident::new(record.city.unwrap_or_default(), occurred_at)
        .with_gender(VictimGender::from_raw(record.victim_gender.as_deref()))
        .with_police_deployed(record.police_deployed.as_deref().and_then(parse_police_deployed))
        .with_raw_time(raw_time);

    incident.crime_domain = non_blank(record.crime_domain);
    incident.crime_description = non_blank(record.crime_description);
    incident
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(city: &str, time: &str) -> IncidentRecord {
        IncidentRecord {
            city: Some(city.to_string()),
            victim_gender: Some("F".to_string()),
            crime_domain: Some("Violent Crime".to_string()),
            crime_description: Some("HOMICIDE".to_string()),
            police_deployed: Some("14".to_string()),
            time_of_occurrence: Some(time.to_string()),
        }
    }

    #[test]
    fn trims_city_and_derives_fields() {
        let incident = preprocess(record("  Mumbai ", "02-01-2020 22:30"));
        assert_eq!(incident.city.as_deref(), Some("Mumbai"));
        assert_eq!(incident.hour, Some(22));
        assert_eq!(incident.victim_gender, VictimGender::Female);
        assert_eq!(incident.police_deployed, Some(14.0));
        assert_eq!(incident.time_of_occurrence, "02-01-2020 22:30");
        assert_eq!(incident.crime_domain.as_deref(), Some("Violent Crime"));
    }

    #[test]
    fn unparseable_timestamp_leaves_hour_absent() {
        let incident = preprocess(record("Pune", "sometime"));
        assert!(incident.occurred_at.is_none());
        assert!(incident.hour.is_none());
        assert!(incident.date.is_none());
        assert_eq!(incident.time_of_occurrence, "sometime");
    }

    #[test]
    fn blank_cells_become_missing() {
        let incident = preprocess(IncidentRecord {
            crime_domain: Some("   ".to_string()),
            police_deployed: Some("n/a".to_string()),
            ..IncidentRecord::default()
        });
        assert!(incident.city.is_none());
        assert!(incident.crime_domain.is_none());
        assert!(incident.police_deployed.is_none());
        assert_eq!(incident.victim_gender, VictimGender::Other);
    }
}
