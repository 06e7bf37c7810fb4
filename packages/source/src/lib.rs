#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime dataset loading and preprocessing.
//!
//! The dataset is read from CSV exactly once at startup and turned into an
//! immutable [`Dataset`]. Request handlers receive the dataset by reference
//! and build filtered views from it; nothing ever mutates it after load.

pub mod parsing;
pub mod preprocess;

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use crime_dash_crime_models::{Incident, IncidentRecord};

/// Errors that can occur while loading the dataset.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// I/O error (file open/read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// The read-only, preprocessed crime dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    incidents: Vec<Incident>,
    domain_options: Vec<String>,
    city_options: Vec<String>,
    unparsed_timestamps: usize,
}

impl Dataset {
    /// Builds a dataset from already preprocessed incidents.
    #[must_use]
    pub fn new(incidents: Vec<Incident>) -> Self {
        let domain_options: BTreeSet<&str> = incidents
            .iter()
            .filter_map(|i| i.crime_domain.as_deref())
            .collect();
        let city_options: BTreeSet<&str> =
            incidents.iter().filter_map(|i| i.city.as_deref()).collect();
        let unparsed_timestamps = incidents.iter().filter(|i| i.occurred_at.is_none()).count();

        let domain_options = domain_options.into_iter().map(str::to_string).collect();
        let city_options = city_options.into_iter().map(str::to_string).collect();

        Self {
            incidents,
            domain_options,
            city_options,
            unparsed_timestamps,
        }
    }

    /// All incidents in file order.
    #[must_use]
    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    /// An unfiltered view over every incident.
    #[must_use]
    pub fn view(&self) -> Vec<&Incident> {
        self.incidents.iter().collect()
    }

    /// Number of incidents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    /// Whether the dataset has no incidents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    /// Distinct crime domains, sorted. Missing domains are excluded.
    #[must_use]
    pub fn domain_options(&self) -> &[String] {
        &self.domain_options
    }

    /// Distinct city names, sorted. Incidents without a city are excluded.
    #[must_use]
    pub fn city_options(&self) -> &[String] {
        &self.city_options
    }

    /// Number of rows whose timestamp could not be parsed.
    #[must_use]
    pub const fn unparsed_timestamps(&self) -> usize {
        self.unparsed_timestamps
    }
}

/// Loads and preprocesses the dataset from a CSV file.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be opened or a row cannot be
/// parsed as CSV.
pub fn load_dataset(path: &Path) -> Result<Dataset, SourceError> {
    log::info!("Loading crime dataset from {}", path.display());
    let file = std::fs::File::open(path)?;
    let dataset = load_from_reader(file)?;

    log::info!(
        "Loaded {} incidents ({} cities, {} domains)",
        dataset.len(),
        dataset.city_options().len(),
        dataset.domain_options().len()
    );
    if dataset.unparsed_timestamps() > 0 {
        log::warn!(
            "{} incidents have an unparseable Time of Occurrence and will never match a time window",
            dataset.unparsed_timestamps()
        );
    }

    Ok(dataset)
}

/// Loads and preprocesses a dataset from any CSV reader with a header row.
///
/// # Errors
///
/// Returns [`SourceError::Csv`] if a row cannot be parsed.
pub fn load_from_reader<R: Read>(reader: R) -> Result<Dataset, SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let incidents = rdr
        .deserialize::<IncidentRecord>()
        .map(|row| row.map(preprocess::preprocess))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Dataset::new(incidents))
}
