//! Predicate filters over incident views.
//!
//! Every filter takes a view (a slice of borrowed incidents) and returns a
//! new, narrower view. `None` parameters are no-ops that return the view
//! unchanged. Filters are independent predicates, so composition order
//! only affects how much work later filters do.

use crime_dash_analytics_models::{FilterParams, TimeWindow};
use crime_dash_crime_models::{Incident, VictimGender};
use crime_dash_source::Dataset;

/// Keeps incidents whose hour falls in `window`.
///
/// Incidents with an unparseable timestamp never match a window.
#[must_use]
pub fn filter_time_window<'a>(
    view: &[&'a Incident],
    window: Option<TimeWindow>,
) -> Vec<&'a Incident> {
    let Some(window) = window else {
        return view.to_vec();
    };
    view.iter()
        .copied()
        .filter(|i| window.contains(i.hour))
        .collect()
}

/// Keeps incidents whose victim gender equals `gender`.
#[must_use]
pub fn filter_gender<'a>(view: &[&'a Incident], gender: Option<VictimGender>) -> Vec<&'a Incident> {
    let Some(gender) = gender else {
        return view.to_vec();
    };
    view.iter()
        .copied()
        .filter(|i| i.victim_gender == gender)
        .collect()
}

/// Keeps incidents whose crime domain equals `domain` exactly.
#[must_use]
pub fn filter_domain<'a>(view: &[&'a Incident], domain: Option<&str>) -> Vec<&'a Incident> {
    let Some(domain) = domain else {
        return view.to_vec();
    };
    view.iter()
        .copied()
        .filter(|i| i.crime_domain.as_deref() == Some(domain))
        .collect()
}

/// Keeps incidents whose city equals `city` exactly.
#[must_use]
pub fn filter_city<'a>(view: &[&'a Incident], city: Option<&str>) -> Vec<&'a Incident> {
    let Some(city) = city else {
        return view.to_vec();
    };
    view.iter()
        .copied()
        .filter(|i| i.city.as_deref() == Some(city))
        .collect()
}

/// Applies every active filter in `params` to the whole dataset, in the
/// order time, gender, domain, city.
#[must_use]
pub fn apply_filters<'a>(dataset: &'a Dataset, params: &FilterParams) -> Vec<&'a Incident> {
    let view = dataset.view();
    let view = filter_time_window(&view, params.time_range.window());
    let view = filter_gender(&view, params.gender);
    let view = filter_domain(&view, params.domain.as_deref());
    let view = filter_city(&view, params.city.as_deref());

    log::debug!(
        "Filters {params:?} kept {} of {} incidents",
        view.len(),
        dataset.len()
    );

    view
}
