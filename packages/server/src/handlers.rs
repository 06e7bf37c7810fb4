//! HTTP handler functions for the crime dashboard.

use actix_web::{HttpResponse, web};
use crime_dash_analytics::{
    aggregate_by_city, aggregate_by_city_domain, aggregate_by_hour, apply_filters,
    forecast_dataset, profile_city, severity_breakdown,
};
use crime_dash_analytics_models::HeatPoint;
use crime_dash_geocoder::heat_points;
use crime_dash_render::chart::render_forecast_chart;
use crime_dash_render::heatmap::{
    HEATMAP_FILE, HOURLY_HEATMAP_FILE, render_heatmap, render_hourly_heatmap,
};
use crime_dash_server_models::{
    ApiHealth, CityForm, CityPredictionView, DashboardView, FilterForm, FilterOptions,
    ForecastView, Selections, UpdateMapResponse,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /`
pub async fn index_get(
    state: web::Data<AppState>,
    form: Option<web::Query<FilterForm>>,
) -> HttpResponse {
    dashboard(&state, &form.map(web::Query::into_inner).unwrap_or_default())
}

/// `POST /`
pub async fn index_post(
    state: web::Data<AppState>,
    form: Option<web::Form<FilterForm>>,
) -> HttpResponse {
    dashboard(&state, &filter_form(form))
}

/// Filters by time, gender, and domain (the city selection is only
/// echoed), renders the heatmap, and returns the dashboard view.
fn dashboard(state: &AppState, form: &FilterForm) -> HttpResponse {
    let params = form.params();
    let view = apply_filters(&state.dataset, &params.without_city());

    let counts = aggregate_by_city(&view);
    let city_count = counts.len();
    let cities = state.cities.locate(counts);

    if let Err(e) = render_heatmap(&heat_points(&cities), &state.map_config, &state.static_dir) {
        log::error!("Failed to render heatmap: {e}");
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Failed to render heatmap"
        }));
    }

    HttpResponse::Ok().json(DashboardView {
        selections: Selections::from(&params),
        options: options(state),
        record_count: view.len(),
        city_count,
        domains: aggregate_by_city_domain(&view),
        severity: severity_breakdown(&view),
        cities,
        map_url: artifact_url(HEATMAP_FILE),
    })
}

/// `POST /update_map`
///
/// Applies every filter, including the city, and re-renders the heatmap.
pub async fn update_map(
    state: web::Data<AppState>,
    form: Option<web::Form<FilterForm>>,
) -> HttpResponse {
    let params = filter_form(form).params();
    let view = apply_filters(&state.dataset, &params);
    let cities = state.cities.locate(aggregate_by_city(&view));

    match render_heatmap(&heat_points(&cities), &state.map_config, &state.static_dir) {
        Ok(_) => HttpResponse::Ok().json(UpdateMapResponse {
            map_url: artifact_url(HEATMAP_FILE),
            record_count: view.len(),
            city_count: cities.len(),
        }),
        Err(e) => {
            log::error!("Failed to render heatmap: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to render heatmap"
            }))
        }
    }
}

/// `POST /hourly_map`
///
/// Renders one heatmap frame per hour of the filtered view.
pub async fn hourly_map(
    state: web::Data<AppState>,
    form: Option<web::Form<FilterForm>>,
) -> HttpResponse {
    let params = filter_form(form).params();
    let view = apply_filters(&state.dataset, &params);

    let frames: Vec<(u32, Vec<HeatPoint>)> = aggregate_by_hour(&view)
        .into_iter()
        .map(|frame| {
            let located = state.cities.locate(frame.cities);
            (frame.hour, heat_points(&located))
        })
        .collect();
    let city_count = aggregate_by_city(&view).len();

    match render_hourly_heatmap(&frames, &state.map_config, &state.static_dir) {
        Ok(_) => HttpResponse::Ok().json(UpdateMapResponse {
            map_url: artifact_url(HOURLY_HEATMAP_FILE),
            record_count: view.len(),
            city_count,
        }),
        Err(e) => {
            log::error!("Failed to render hourly heatmap: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to render hourly heatmap"
            }))
        }
    }
}

/// `POST /predict_crime`
///
/// Forecasts the next seven days from the whole dataset. The submitted
/// filters are echoed but not applied.
pub async fn predict_crime(
    state: web::Data<AppState>,
    form: Option<web::Form<FilterForm>>,
) -> HttpResponse {
    let selections = Selections::from(&filter_form(form).params());
    let dataset = state.dataset.clone();
    let result = web::block(move || {
        let (history, forecast) = forecast_dataset(&dataset);
        let chart = match render_forecast_chart(&history, &forecast.points) {
            Ok(chart) => Some(chart),
            Err(e) => {
                log::warn!("Failed to render forecast chart: {e}");
                None
            }
        };
        (history.len(), forecast, chart)
    })
    .await;

    match result {
        Ok((history_days, forecast, chart)) => HttpResponse::Ok().json(ForecastView {
            selections,
            options: options(&state),
            filters_applied: false,
            forecast: forecast.points,
            outcome: forecast.outcome,
            history_days,
            chart_png_base64: chart,
            record_count: state.dataset.len(),
            city_count: state.dataset.city_options().len(),
        }),
        Err(e) => {
            log::error!("Forecast task failed: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to compute forecast"
            }))
        }
    }
}

/// `POST /predict_city_crimes`
pub async fn predict_city_crimes(
    state: web::Data<AppState>,
    form: Option<web::Form<CityForm>>,
) -> HttpResponse {
    let form = form.map(web::Form::into_inner).unwrap_or_default();
    let city = form.city.as_deref().map(str::trim).unwrap_or_default();
    let prediction = profile_city(&state.dataset, city);

    HttpResponse::Ok().json(CityPredictionView {
        selections: Selections::unfiltered(Some(city.to_string()).filter(|c| !c.is_empty())),
        options: options(&state),
        prediction,
        record_count: state.dataset.len(),
        city_count: state.dataset.city_options().len(),
    })
}

/// A form body that is missing, mistyped, or malformed selects everything.
fn filter_form(form: Option<web::Form<FilterForm>>) -> FilterForm {
    form.map_or_else(
        || {
            log::debug!("Unreadable filter form, defaulting to All");
            FilterForm::default()
        },
        web::Form::into_inner,
    )
}

fn options(state: &AppState) -> FilterOptions {
    FilterOptions::new(state.dataset.domain_options(), state.dataset.city_options())
}

/// URL of a generated page with a cache-busting query string.
fn artifact_url(file: &str) -> String {
    format!(
        "/static/{file}?v={}",
        chrono::Utc::now().timestamp_millis()
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use actix_web::{App, test};
    use chrono::{Days, NaiveDate};
    use crime_dash_crime_models::{Incident, VictimGender};
    use crime_dash_geocoder::CityTable;
    use crime_dash_render::MapConfig;
    use crime_dash_source::Dataset;
    use serde_json::Value;

    use super::*;
    use crate::configure;

    fn at(day: u64, hour: u32) -> chrono::NaiveDateTime {
        (NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Days::new(day))
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    /// Twelve days of Delhi incidents (all male victims at 23:00), plus
    /// a few in Pune and one in a city with no coordinates.
    fn dataset() -> Dataset {
        let mut incidents: Vec<Incident> = (0..12)
            .flat_map(|day| {
                (0..=day % 3).map(move |_| {
                    Incident::new("Delhi", Some(at(day, 23)))
                        .with_gender(VictimGender::Male)
                        .with_domain("Violent Crime")
                        .with_description("ASSAULT")
                        .with_police_deployed(Some(14.0))
                })
            })
            .collect();
        incidents.push(
            Incident::new("Pune", Some(at(0, 9)))
                .with_gender(VictimGender::Female)
                .with_domain("Other Crime")
                .with_description("FRAUD")
                .with_police_deployed(Some(3.0)),
        );
        incidents.push(
            Incident::new("Pune", Some(at(1, 1)))
                .with_gender(VictimGender::Female)
                .with_domain("Other Crime")
                .with_description("FRAUD"),
        );
        incidents.push(Incident::new("Atlantis", Some(at(2, 23))).with_gender(VictimGender::Female));
        Dataset::new(incidents)
    }

    struct TestDir(PathBuf);

    impl Drop for TestDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn state(dir: &TestDir) -> web::Data<AppState> {
        web::Data::new(AppState {
            dataset: Arc::new(dataset()),
            cities: Arc::new(CityTable::embedded().unwrap()),
            map_config: Arc::new(MapConfig::embedded().unwrap()),
            static_dir: dir.0.clone(),
        })
    }

    fn test_dir() -> TestDir {
        let dir = std::env::temp_dir().join(format!("crime_dash_server_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        TestDir(dir)
    }

    macro_rules! app {
        ($dir:expr) => {
            test::init_service(App::new().app_data(state($dir)).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let dir = test_dir();
        let app = app!(&dir);
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn dashboard_without_filters_counts_everything() {
        let dir = test_dir();
        let app = app!(&dir);
        let req = test::TestRequest::get().uri("/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["recordCount"], 27);
        assert_eq!(body["cityCount"], 3);
        assert_eq!(body["selections"]["timeRange"], "All");
        assert_eq!(body["options"]["domains"][0], "All");
        assert_eq!(body["domains"][0]["city"], "Delhi");
        assert_eq!(body["domains"][0]["count"], 24);
        assert_eq!(body["severity"][2]["severity"], "High");
        assert_eq!(body["severity"][2]["count"], 24);
        assert!(
            body["mapUrl"]
                .as_str()
                .unwrap()
                .starts_with("/static/map.html?v=")
        );

        let html = std::fs::read_to_string(dir.0.join(HEATMAP_FILE)).unwrap();
        assert!(html.contains("L.heatLayer"));
    }

    #[actix_web::test]
    async fn unreadable_forms_fall_back_to_all() {
        let dir = test_dir();
        let app = app!(&dir);
        let routes = [
            "/",
            "/update_map",
            "/hourly_map",
            "/predict_crime",
            "/predict_city_crimes",
        ];

        for uri in routes {
            let req = test::TestRequest::post().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success(), "bare POST {uri}: {}", resp.status());

            let req = test::TestRequest::post()
                .uri(uri)
                .insert_header(("content-type", "application/x-www-form-urlencoded"))
                .set_payload("gender=M&gender=F&city=Delhi&city=Pune")
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success(), "duplicate keys {uri}: {}", resp.status());
        }

        let req = test::TestRequest::post()
            .uri("/update_map")
            .insert_header(("content-type", "application/x-www-form-urlencoded"))
            .set_payload("gender=M&gender=F")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["recordCount"], 27);

        let req = test::TestRequest::get().uri("/?gender=M&gender=F").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["selections"]["gender"], "All");
        assert_eq!(body["recordCount"], 27);
    }

    #[actix_web::test]
    async fn dashboard_applies_filters_but_not_city() {
        let dir = test_dir();
        let app = app!(&dir);
        let req = test::TestRequest::post()
            .uri("/")
            .set_form([
                ("time_range", "Night (22–05)"),
                ("gender", "F"),
                ("domain", "All"),
                ("city", "Pune"),
            ])
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        // Pune at 01:00 and Atlantis at 23:00; the 09:00 Pune row is outside the window
        assert_eq!(body["recordCount"], 2);
        assert_eq!(body["selections"]["gender"], "F");
        assert_eq!(body["selections"]["city"], "Pune");

        let cities = body["cities"].as_array().unwrap();
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[0]["city"], "Atlantis");
        assert!(cities[0]["latitude"].is_null());
    }

    #[actix_web::test]
    async fn map_counts_only_cover_known_cities() {
        let dir = test_dir();
        let app = app!(&dir);
        let req = test::TestRequest::get().uri("/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let located: u64 = body["cities"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|c| !c["latitude"].is_null())
            .map(|c| c["count"].as_u64().unwrap())
            .sum();
        assert_eq!(located, 26);
    }

    #[actix_web::test]
    async fn update_map_applies_city() {
        let dir = test_dir();
        let app = app!(&dir);
        let req = test::TestRequest::post()
            .uri("/update_map")
            .set_form([("city", "Pune")])
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["recordCount"], 2);
        assert_eq!(body["cityCount"], 1);

        let html = std::fs::read_to_string(dir.0.join(HEATMAP_FILE)).unwrap();
        assert!(html.contains("[[18.5204,73.8567,2.0]]"));
    }

    #[actix_web::test]
    async fn hourly_map_writes_frames() {
        let dir = test_dir();
        let app = app!(&dir);
        let req = test::TestRequest::post()
            .uri("/hourly_map")
            .set_form([("domain", "Violent Crime")])
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["recordCount"], 24);
        assert!(
            body["mapUrl"]
                .as_str()
                .unwrap()
                .starts_with("/static/map_hourly.html?v=")
        );
        let html = std::fs::read_to_string(dir.0.join(HOURLY_HEATMAP_FILE)).unwrap();
        assert!(html.contains("\"23:00\""));
    }

    #[actix_web::test]
    async fn forecast_has_seven_days_after_history() {
        let dir = test_dir();
        let app = app!(&dir);
        let req = test::TestRequest::post().uri("/predict_crime").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let forecast = body["forecast"].as_array().unwrap();
        assert_eq!(forecast.len(), 7);
        assert_eq!(forecast[0]["date"], "2020-01-13");
        assert_eq!(forecast[6]["date"], "2020-01-19");
        assert_eq!(body["historyDays"], 12);
        assert!(body["chartPngBase64"].is_string());
    }

    #[actix_web::test]
    async fn forecast_ignores_active_filters() {
        let dir = test_dir();
        let app = app!(&dir);

        let unfiltered = test::TestRequest::post().uri("/predict_crime").to_request();
        let unfiltered: Value = test::call_and_read_body_json(&app, unfiltered).await;

        // No incident matches this combination, yet the forecast is unchanged
        let filtered = test::TestRequest::post()
            .uri("/predict_crime")
            .set_form([
                ("time_range", "Morning (05–12)"),
                ("gender", "M"),
                ("domain", "Other Crime"),
            ])
            .to_request();
        let filtered: Value = test::call_and_read_body_json(&app, filtered).await;

        assert_eq!(filtered["forecast"], unfiltered["forecast"]);
        assert_eq!(filtered["outcome"], unfiltered["outcome"]);
        assert_eq!(filtered["filtersApplied"], false);
        assert_eq!(filtered["selections"]["gender"], "M");
        assert_eq!(filtered["selections"]["domain"], "Other Crime");
        assert_eq!(filtered["recordCount"], 27);
    }

    #[actix_web::test]
    async fn city_prediction_for_unknown_city_is_not_an_error() {
        let dir = test_dir();
        let app = app!(&dir);
        let req = test::TestRequest::post()
            .uri("/predict_city_crimes")
            .set_form([("city", "Gotham")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["prediction"]["error"], "No data for Gotham");
        assert_eq!(body["selections"]["city"], "Gotham");
    }

    #[actix_web::test]
    async fn city_prediction_without_city_is_no_data() {
        let dir = test_dir();
        let app = app!(&dir);
        let req = test::TestRequest::post()
            .uri("/predict_city_crimes")
            .set_form([("city", "  ")])
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["prediction"]["error"], "No data for ");
        assert!(body["prediction"]["likelyCrimes"].is_null());
        assert!(body["selections"]["city"].is_null());
    }

    #[actix_web::test]
    async fn city_prediction_profiles_known_city() {
        let dir = test_dir();
        let app = app!(&dir);
        let req = test::TestRequest::post()
            .uri("/predict_city_crimes")
            .set_form([("city", "Delhi")])
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let prediction = &body["prediction"];
        assert_eq!(prediction["city"], "Delhi");
        assert_eq!(prediction["likelyCrimes"][0], "ASSAULT");
        assert_eq!(prediction["predictedSeverity"], "High");
        assert_eq!(prediction["confidence"], "Medium");
        assert_eq!(prediction["recordCount"], 24);
    }
}
