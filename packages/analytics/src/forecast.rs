//! Seven-day daily incident forecast.
//!
//! Fits an automatically selected ARIMA model when there is enough
//! history and falls back to the flat historical average otherwise. The
//! result records which branch produced the numbers; the caller always
//! gets exactly [`FORECAST_HORIZON_DAYS`] non-negative counts.

use chrono::{Days, NaiveDate};
use crime_dash_analytics_models::{
    DailyPoint, FORECAST_HORIZON_DAYS, FallbackReason, Forecast, ForecastOutcome, ForecastPoint,
};
use crime_dash_source::Dataset;

use crate::aggregate::daily_series;
use crate::arima::{self, ArimaModel, ForecastError};

/// Distinct dates required before a model is fitted.
pub const MIN_MODEL_OBSERVATIONS: usize = 10;

/// Forecasts the next seven days from a daily series.
///
/// Dates start the day after the latest date in `series`. An empty series
/// has no latest date, so the forecast starts tomorrow (UTC).
#[must_use]
pub fn forecast_daily(series: &[DailyPoint]) -> Forecast {
    forecast_daily_with(series, arima::auto_arima)
}

/// [`forecast_daily`] with the model selection step supplied by the
/// caller. Any error from `fit`, or from extrapolating the model it
/// returns, falls back to the flat average.
fn forecast_daily_with(
    series: &[DailyPoint],
    fit: impl FnOnce(&[f64]) -> Result<ArimaModel, ForecastError>,
) -> Forecast {
    let counts: Vec<f64> = series.iter().map(|p| count_as_f64(p.count)).collect();

    let (values, outcome) = match extrapolate(&counts, fit) {
        Ok((values, model)) => {
            log::debug!(
                "Forecast fitted {} (aic {:.2}) on {} days",
                model.order,
                model.aic,
                counts.len()
            );
            (
                values,
                ForecastOutcome::Fitted {
                    order: model.order,
                    aic: model.aic,
                },
            )
        }
        Err(reason) => {
            log::debug!("Forecast using flat average: {reason}");
            (flat_average(&counts), ForecastOutcome::Fallback { reason })
        }
    };

    let last_date = series
        .iter()
        .map(|p| p.date)
        .max()
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    let points = forecast_dates(last_date)
        .into_iter()
        .zip(values)
        .map(|(date, count)| ForecastPoint { date, count })
        .collect();

    Forecast { points, outcome }
}

/// Forecasts from the daily series of the whole, unfiltered dataset.
///
/// Returns the history used alongside the forecast.
#[must_use]
pub fn forecast_dataset(dataset: &Dataset) -> (Vec<DailyPoint>, Forecast) {
    let history = daily_series(&dataset.view());
    let forecast = forecast_daily(&history);
    (history, forecast)
}

/// Repeats the rounded mean of `counts` for every forecast day, or zero
/// when there are no counts.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn flat_average(counts: &[f64]) -> Vec<u64> {
    let average = if counts.is_empty() {
        0
    } else {
        to_count(counts.iter().sum::<f64>() / counts.len() as f64)
    };
    vec![average; FORECAST_HORIZON_DAYS]
}

/// The seven consecutive dates after `last`.
#[must_use]
pub fn forecast_dates(last: NaiveDate) -> Vec<NaiveDate> {
    (1..=FORECAST_HORIZON_DAYS as u64)
        .filter_map(|offset| last.checked_add_days(Days::new(offset)))
        .collect()
}

fn extrapolate(
    counts: &[f64],
    fit: impl FnOnce(&[f64]) -> Result<ArimaModel, ForecastError>,
) -> Result<(Vec<u64>, ArimaModel), FallbackReason> {
    if counts.is_empty() {
        return Err(FallbackReason::EmptySeries);
    }
    if counts.len() < MIN_MODEL_OBSERVATIONS {
        return Err(FallbackReason::InsufficientHistory {
            observations: counts.len(),
            required: MIN_MODEL_OBSERVATIONS,
        });
    }

    let fit_failed = |e: ForecastError| FallbackReason::FitFailed {
        message: e.to_string(),
    };
    let model = fit(counts).map_err(fit_failed)?;
    let raw = model
        .predict(counts, FORECAST_HORIZON_DAYS)
        .map_err(fit_failed)?;

    Ok((raw.into_iter().map(to_count).collect(), model))
}

/// Floors at zero and rounds half to even.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_count(value: f64) -> u64 {
    value.max(0.0).round_ties_even() as u64
}

#[allow(clippy::cast_precision_loss)]
const fn count_as_f64(count: u64) -> f64 {
    count as f64
}
