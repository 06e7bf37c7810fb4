//! Forecast line chart rendered to an inline PNG.
//!
//! History is drawn in blue and the forecast in red with point markers,
//! under a title, dated axes, and a Past/Forecast legend. A grey rule marks
//! where the forecast begins. Text uses an embedded DejaVu Sans face so
//! rendering does not depend on the host's fonts.

use std::sync::OnceLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{Days, NaiveDate};
use crime_dash_analytics_models::{DailyPoint, ForecastPoint};
use image::{ExtendedColorType, ImageEncoder, codecs::png::PngEncoder};
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};

use crate::RenderError;

/// Chart width in pixels.
pub const CHART_WIDTH: u32 = 800;

/// Chart height in pixels.
pub const CHART_HEIGHT: u32 = 400;

/// Chart title.
pub const CHART_TITLE: &str = "Crime counts: historical + 7-day forecast";

const FORECAST_RULE: RGBColor = RGBColor(160, 160, 160);

const CHART_FONT: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

/// Renders history and forecast as a PNG and returns it base64 encoded.
///
/// # Errors
///
/// Returns an error if drawing or PNG encoding fails.
pub fn render_forecast_chart(
    history: &[DailyPoint],
    forecast: &[ForecastPoint],
) -> Result<String, RenderError> {
    let png = forecast_chart_png(history, forecast)?;
    Ok(STANDARD.encode(png))
}

/// Renders history and forecast as PNG bytes.
///
/// # Errors
///
/// Returns an error if drawing or PNG encoding fails.
pub fn forecast_chart_png(
    history: &[DailyPoint],
    forecast: &[ForecastPoint],
) -> Result<Vec<u8>, RenderError> {
    let buffer = draw_chart(history, forecast)?;

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(
        &buffer,
        CHART_WIDTH,
        CHART_HEIGHT,
        ExtendedColorType::Rgb8,
    )?;

    log::debug!(
        "Rendered forecast chart ({} history, {} forecast points, {} bytes)",
        history.len(),
        forecast.len(),
        png.len()
    );

    Ok(png)
}

/// Draws the chart into an RGB buffer of `CHART_WIDTH * CHART_HEIGHT`
/// pixels.
#[allow(clippy::cast_precision_loss)]
fn draw_chart(history: &[DailyPoint], forecast: &[ForecastPoint]) -> Result<Vec<u8>, RenderError> {
    register_chart_font()?;

    let origin = history
        .first()
        .map(|p| p.date)
        .or_else(|| forecast.first().map(|p| p.date));

    let x = |date: NaiveDate| -> f64 {
        origin.map_or(0.0, |o| (date - o).num_days() as f64)
    };
    let past: Vec<(f64, f64)> = history.iter().map(|p| (x(p.date), p.count as f64)).collect();
    let future: Vec<(f64, f64)> = forecast.iter().map(|p| (x(p.date), p.count as f64)).collect();

    let x_max = past
        .iter()
        .chain(&future)
        .map(|(x, _)| *x)
        .fold(1.0, f64::max);
    let y_max = past
        .iter()
        .chain(&future)
        .map(|(_, y)| *y)
        .fold(1.0, f64::max)
        * 1.1;

    let date_label = |offset: &f64| date_at(origin, *offset);

    let mut buffer = vec![0_u8; CHART_WIDTH as usize * CHART_HEIGHT as usize * 3];
    {
        let root =
            BitMapBackend::with_buffer(&mut buffer, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(CHART_TITLE, ("sans-serif", 20))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..x_max, 0.0..y_max)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Count")
            .x_labels(8)
            .x_label_formatter(&date_label)
            .label_style(("sans-serif", 12))
            .draw()
            .map_err(chart_error)?;

        if let (Some(last_past), Some(first_future)) = (past.last(), future.first()) {
            let boundary = f64::midpoint(last_past.0, first_future.0);
            chart
                .draw_series(LineSeries::new(
                    [(boundary, 0.0), (boundary, y_max)],
                    &FORECAST_RULE,
                ))
                .map_err(chart_error)?;
        }

        chart
            .draw_series(LineSeries::new(past, BLUE.stroke_width(2)))
            .map_err(chart_error)?
            .label("Past")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

        chart
            .draw_series(LineSeries::new(future.clone(), RED.stroke_width(2)))
            .map_err(chart_error)?
            .label("Forecast")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));
        chart
            .draw_series(PointSeries::of_element(
                future,
                4,
                RED.filled(),
                &|coord, size, style| EmptyElement::at(coord) + Circle::new((0, 0), size, style),
            ))
            .map_err(chart_error)?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font(("sans-serif", 12))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
    }

    Ok(buffer)
}

/// `MM-DD` label for a day offset from `origin`; blank for fractional or
/// negative offsets.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn date_at(origin: Option<NaiveDate>, offset: f64) -> String {
    if offset < 0.0 || offset.fract().abs() > f64::EPSILON {
        return String::new();
    }
    origin
        .and_then(|o| o.checked_add_days(Days::new(offset as u64)))
        .map(|date| date.format("%m-%d").to_string())
        .unwrap_or_default()
}

/// Registers the embedded face as the `sans-serif` family, once.
fn register_chart_font() -> Result<(), RenderError> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();

    let registered = *REGISTERED.get_or_init(|| {
        match register_font("sans-serif", FontStyle::Normal, CHART_FONT) {
            Ok(()) => true,
            Err(_) => {
                log::error!("Embedded chart font is invalid");
                false
            }
        }
    });
    if registered {
        Ok(())
    } else {
        Err(RenderError::Chart("embedded chart font is invalid".to_string()))
    }
}

fn chart_error<E: std::error::Error>(e: E) -> RenderError {
    RenderError::Chart(e.to_string())
}
