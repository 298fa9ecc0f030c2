//! JSON API for parsed tide predictions.
//!
//! Every registered station's export is parsed once at startup and shared
//! read-only between handlers. Routes:
//! - `GET /health`
//! - `GET /api/stations`
//! - `GET /api/tides/{station}?date=YYYY-MM-DD`
//! - `GET /api/tides/{station}/series?date=YYYY-MM-DD&mode=nearest|linear`
//! - `GET /api/tides/{station}/stats?date=YYYY-MM-DD`
//! - `GET /api/tides/{station}/range?from=YYYY-MM-DD&to=YYYY-MM-DD`
//! - `GET /api/tides/{station}/range/stats?from=YYYY-MM-DD&to=YYYY-MM-DD`

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::{
    self, DailyStatistics, HourlySeries, RangeSeries, RangeStatistics, SeriesMode, parse_iso_date,
};
use crate::errors::TideError;
use crate::models::{OutputPrediction, TideTable};
use crate::stations::{Station, StationRegistry};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5001,
            host: "127.0.0.1".to_string(),
        }
    }
}

/// A station together with its parsed table, if it loaded.
#[derive(Debug)]
struct LoadedStation {
    station: Station,
    table: Result<Arc<TideTable>, String>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    stations: Arc<Vec<LoadedStation>>,
}

impl AppState {
    /// Parse every registered station's export.
    ///
    /// Stations whose files fail to load are kept and reported as
    /// unavailable.
    #[must_use]
    pub fn load(registry: &StationRegistry) -> Self {
        let stations = registry
            .stations()
            .iter()
            .map(|station| {
                let table = match registry.load(&station.key) {
                    Ok(table) => {
                        tracing::info!(
                            "loaded {} predictions for {} ({} rows skipped)",
                            table.predictions.len(),
                            station.key,
                            table.skipped_rows
                        );
                        Ok(Arc::new(table))
                    }
                    Err(e) => {
                        tracing::warn!("station {} unavailable: {}", station.key, e);
                        Err(e.to_string())
                    }
                };
                LoadedStation {
                    station: station.clone(),
                    table,
                }
            })
            .collect();

        Self {
            stations: Arc::new(stations),
        }
    }

    /// Build state from already-parsed tables.
    #[must_use]
    pub fn from_tables(tables: Vec<(Station, TideTable)>) -> Self {
        let stations = tables
            .into_iter()
            .map(|(station, table)| LoadedStation {
                station,
                table: Ok(Arc::new(table)),
            })
            .collect();
        Self {
            stations: Arc::new(stations),
        }
    }

    fn table(&self, key: &str) -> Result<&TideTable, ApiError> {
        let key = key.to_lowercase();
        let loaded = self
            .stations
            .iter()
            .find(|s| s.station.key == key)
            .ok_or_else(|| ApiError::from(TideError::UnknownStation(key.clone())))?;

        match &loaded.table {
            Ok(table) => Ok(Arc::as_ref(table)),
            Err(e) => Err(ApiError::NotFound(format!("station {key} unavailable: {e}"))),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// API error rendered as `{"error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<TideError> for ApiError {
    fn from(e: TideError) -> Self {
        match e {
            TideError::InvalidDate(_) | TideError::Validation(_) => Self::BadRequest(e.to_string()),
            TideError::UnknownStation(_) => Self::NotFound(e.to_string()),
            _ => Self::Internal(e.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            Self::NotFound(m) => (StatusCode::NOT_FOUND, m),
            Self::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn no_data(station: &str, what: &str) -> ApiError {
    ApiError::NotFound(format!("no tide data for {station} {what}"))
}

// ============================================================================
// Request / response types
// ============================================================================

/// `?date=` query.
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

/// `?date=&mode=` query.
#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub date: String,
    pub mode: Option<String>,
}

/// `?from=&to=` query.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: String,
    pub to: String,
}

impl RangeQuery {
    fn dates(&self) -> Result<(NaiveDate, NaiveDate), ApiError> {
        Ok((parse_iso_date(&self.from)?, parse_iso_date(&self.to)?))
    }
}

/// A view tagged with the station it came from.
#[derive(Debug, Serialize)]
pub struct StationResponse<T> {
    pub station: String,
    #[serde(flatten)]
    pub data: T,
}

/// Predictions on one date.
#[derive(Debug, Serialize)]
pub struct DayPredictions {
    pub date: NaiveDate,
    pub predictions: Vec<OutputPrediction>,
}

/// Registry entry with load status.
#[derive(Debug, Serialize)]
pub struct StationSummary {
    pub key: String,
    pub name: String,
    pub available: bool,
    pub station_id: Option<String>,
    pub predictions: usize,
    pub skipped_rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub error: Option<String>,
}

type ApiResult<T> = Result<Json<StationResponse<T>>, ApiError>;

fn respond<T>(station: &str, data: T) -> ApiResult<T> {
    Ok(Json(StationResponse {
        station: station.to_lowercase(),
        data,
    }))
}

// ============================================================================
// Router
// ============================================================================

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/stations", get(stations_handler))
        .route("/api/tides/{station}", get(day_handler))
        .route("/api/tides/{station}/series", get(series_handler))
        .route("/api/tides/{station}/stats", get(stats_handler))
        .route("/api/tides/{station}/range", get(range_handler))
        .route("/api/tides/{station}/range/stats", get(range_stats_handler))
        .with_state(state)
}

/// Start the web server.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn run_server(config: ServerConfig, registry: &StationRegistry) -> anyhow::Result<()> {
    let state = AppState::load(registry);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("🌊 tidecast API starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

/// Registered stations and whether their data loaded.
async fn stations_handler(State(state): State<AppState>) -> Json<Vec<StationSummary>> {
    let summaries = state
        .stations
        .iter()
        .map(|loaded| {
            let (available, station_id, predictions, skipped_rows, span, error) =
                match &loaded.table {
                    Ok(t) => (
                        true,
                        t.header.station_id.clone(),
                        t.predictions.len(),
                        t.skipped_rows,
                        t.date_span(),
                        None,
                    ),
                    Err(e) => (false, None, 0, 0, None, Some(e.clone())),
                };
            StationSummary {
                key: loaded.station.key.clone(),
                name: loaded.station.name.clone(),
                available,
                station_id,
                predictions,
                skipped_rows,
                first_date: span.map(|(first, _)| first),
                last_date: span.map(|(_, last)| last),
                error,
            }
        })
        .collect();
    Json(summaries)
}

/// Predictions for one date.
async fn day_handler(
    State(state): State<AppState>,
    Path(station): Path<String>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> ApiResult<DayPredictions> {
    let Query(query) = query?;
    let table = state.table(&station)?;
    let date = parse_iso_date(&query.date)?;

    let day = analysis::predictions_for_date(table, date);
    if day.is_empty() {
        return Err(no_data(&station, &query.date));
    }

    respond(
        &station,
        DayPredictions {
            date,
            predictions: day.iter().map(OutputPrediction::from).collect(),
        },
    )
}

/// 24-hour series for one date.
async fn series_handler(
    State(state): State<AppState>,
    Path(station): Path<String>,
    query: Result<Query<SeriesQuery>, QueryRejection>,
) -> ApiResult<HourlySeries> {
    let Query(query) = query?;
    let table = state.table(&station)?;
    let date = parse_iso_date(&query.date)?;
    let mode = match query.mode.as_deref() {
        Some(m) => m.parse::<SeriesMode>().map_err(ApiError::BadRequest)?,
        None => SeriesMode::default(),
    };

    let series = analysis::hourly_series(table, date, mode)
        .ok_or_else(|| no_data(&station, &query.date))?;
    respond(&station, series)
}

/// High/low statistics for one date.
async fn stats_handler(
    State(state): State<AppState>,
    Path(station): Path<String>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> ApiResult<DailyStatistics> {
    let Query(query) = query?;
    let table = state.table(&station)?;
    let date = parse_iso_date(&query.date)?;

    let stats = analysis::daily_statistics(table, date)
        .ok_or_else(|| no_data(&station, &query.date))?;
    respond(&station, stats)
}

/// Every extremum in an inclusive date range.
async fn range_handler(
    State(state): State<AppState>,
    Path(station): Path<String>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<RangeSeries> {
    let Query(query) = query?;
    let table = state.table(&station)?;
    let (from, to) = query.dates()?;

    let series = analysis::range_series(table, from, to)
        .ok_or_else(|| no_data(&station, &format!("{} to {}", query.from, query.to)))?;
    respond(&station, series)
}

/// Statistics over an inclusive date range.
async fn range_stats_handler(
    State(state): State<AppState>,
    Path(station): Path<String>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<RangeStatistics> {
    let Query(query) = query?;
    let table = state.table(&station)?;
    let (from, to) = query.dates()?;

    let stats = analysis::range_statistics(table, from, to)
        .ok_or_else(|| no_data(&station, &format!("{} to {}", query.from, query.to)))?;
    respond(&station, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_tide_text;
    use std::path::PathBuf;

    const EXPORT: &str = "StationName: Port Jefferson, NY
Stationid: 8514322
Units: Feet
2025/06/01\tSun\t03:12 AM\t-0.41\t-12\tL
2025/06/01\tSun\t09:30 AM\t7.02\t214\tH
2025/06/01\tSun\t03:41 PM\t0.10\t3\tL
2025/06/01\tSun\t09:58 PM\t7.91\t241\tH
2025/06/02\tMon\t10:20 AM\t6.90\t210\tH
";

    fn state() -> AppState {
        let station = Station {
            key: "portjefferson".into(),
            name: "Port Jefferson, NY".into(),
            path: PathBuf::from("portJeff.txt"),
        };
        AppState::from_tables(vec![(station, parse_tide_text(EXPORT))])
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn pj() -> Path<String> {
        Path("portjefferson".into())
    }

    fn date(d: &str) -> Result<Query<DateQuery>, QueryRejection> {
        Ok(Query(DateQuery { date: d.into() }))
    }

    fn range(from: &str, to: &str) -> Result<Query<RangeQuery>, QueryRejection> {
        Ok(Query(RangeQuery {
            from: from.into(),
            to: to.into(),
        }))
    }

    #[tokio::test]
    async fn test_day_predictions() {
        let response = day_handler(State(state()), pj(), date("2025-06-01"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["station"], "portjefferson");
        assert_eq!(json["predictions"].as_array().map(Vec::len), Some(4));
        assert_eq!(json["predictions"][0]["units"], "meters");
    }

    #[tokio::test]
    async fn test_unknown_station_is_404() {
        let response = day_handler(State(state()), Path("atlantis".into()), date("2025-06-01"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("atlantis"));
    }

    #[tokio::test]
    async fn test_invalid_date_is_400() {
        let response = stats_handler(State(state()), pj(), date("06/01/2025"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_date_without_data_is_404() {
        let response = day_handler(State(state()), pj(), date("2030-01-01"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_series_modes() {
        let query = Ok(Query(SeriesQuery {
            date: "2025-06-01".into(),
            mode: Some("linear".into()),
        }));
        let response = series_handler(State(state()), pj(), query)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["mode"], "linear");
        assert_eq!(json["heights"].as_array().map(Vec::len), Some(24));

        let bad = Ok(Query(SeriesQuery {
            date: "2025-06-01".into(),
            mode: Some("cubic".into()),
        }));
        let response = series_handler(State(state()), pj(), bad)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_daily_stats_in_meters() {
        let response = stats_handler(State(state()), pj(), date("2025-06-01"))
            .await
            .into_response();
        let json = body_json(response).await;
        let high = json["high_tide"]["height"].as_f64().unwrap();
        assert!((high - 7.91 * 0.3048).abs() < 1e-9);
        assert_eq!(json["high_tide"]["time"], "09:58 PM");
    }

    #[tokio::test]
    async fn test_stats_without_low_is_404() {
        let response = stats_handler(State(state()), pj(), date("2025-06-02"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_range_and_range_stats() {
        let response = range_handler(
            State(state()),
            pj(),
            range("2025-06-01", "2025-06-02"),
        )
        .await
        .into_response();
        let json = body_json(response).await;
        assert_eq!(json["heights"].as_array().map(Vec::len), Some(5));

        let response = range_stats_handler(
            State(state()),
            pj(),
            range("2025-06-01", "2025-06-02"),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["total_highs"], 3);
        assert_eq!(json["total_lows"], 2);
        assert_eq!(json["date_range"], "2025-06-01 to 2025-06-02");
    }

    #[tokio::test]
    async fn test_range_rejects_bad_bound() {
        let response = range_handler(
            State(state()),
            pj(),
            range("2025-06-01", "tomorrow"),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unavailable_station_listed() {
        let mut registry = StationRegistry::default();
        registry.register("ghost=/nonexistent/ghost.txt".parse().unwrap());
        let state = AppState::load(&registry);

        let Json(summaries) = stations_handler(State(state.clone())).await;
        assert_eq!(summaries.len(), 1);
        assert!(!summaries[0].available);
        assert!(summaries[0].error.is_some());

        let response = day_handler(State(state), Path("ghost".into()), date("2025-06-01"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_station_summary() {
        let Json(summaries) = stations_handler(State(state())).await;
        assert_eq!(summaries[0].station_id.as_deref(), Some("8514322"));
        assert_eq!(summaries[0].predictions, 5);
        assert_eq!(
            summaries[0].last_date,
            NaiveDate::from_ymd_opt(2025, 6, 2)
        );
    }

    #[tokio::test]
    async fn test_missing_query_parameters_return_json_errors() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, create_router(state())).await.unwrap();
        });

        let client = reqwest::Client::new();
        let paths = [
            "/api/tides/portjefferson",
            "/api/tides/portjefferson/series",
            "/api/tides/portjefferson/stats",
            "/api/tides/portjefferson/range?from=2025-06-01",
            "/api/tides/portjefferson/range/stats",
        ];
        for path in paths {
            let response = client
                .get(format!("http://{addr}{path}"))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST, "{path}");

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            assert!(content_type.starts_with("application/json"), "{path}: {content_type}");

            let json: serde_json::Value = response.json().await.unwrap();
            let message = json["error"].as_str().unwrap();
            assert!(message.contains("missing field"), "{path}: {message}");
        }
    }
}
