//! HTTP route handlers for the revenue API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::analytics::Analytics;
use crate::error::RevenueError;
use crate::ledger::Ledger;
use crate::metrics::{parse_date, MetricInput};
use crate::models::{RevenueForecast, RevenueMetric};
use crate::prediction::{ForecastInput, PredictionResult};
use crate::store::RevenueStore;

use super::server::AppState;

const DEFAULT_LATEST_LIMIT: usize = 10;
const DEFAULT_QUICK_DAYS: u32 = 30;
const DEFAULT_MODEL: &str = "linear_regression";
const DEFAULT_PREDICTION_TYPE: &str = "daily";

/// Build all API routes.
pub fn api_routes<L: Ledger, S: RevenueStore>() -> Router<AppState<L, S>> {
    Router::new()
        .route("/api/revenue/metrics", get(metrics::<L, S>).post(record_metric::<L, S>))
        .route("/api/revenue/metrics/collect/:date", post(collect::<L, S>))
        .route("/api/revenue/metrics/collect-range", post(collect_range::<L, S>))
        .route("/api/revenue/forecasts", get(forecasts::<L, S>).post(create_forecast::<L, S>))
        .route("/api/revenue/forecasts/latest", get(latest_forecasts::<L, S>))
        .route("/api/revenue/predict", post(predict::<L, S>))
        .route("/api/revenue/predict/quick", post(quick_predict::<L, S>))
        .route("/api/revenue/analytics", get(analytics::<L, S>))
        .route("/health", get(health))
}

/// Maps invalid input to 400 and everything else to 500.
pub struct ApiError(RevenueError);

impl From<RevenueError> for ApiError {
    fn from(err: RevenueError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_invalid_input() {
            StatusCode::BAD_REQUEST
        } else {
            warn!(error = %self.0, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
struct RangeQuery {
    start_date: Option<String>,
    end_date: Option<String>,
}

impl RangeQuery {
    fn parse(&self, operation: &'static str) -> Result<(Option<NaiveDate>, Option<NaiveDate>), RevenueError> {
        let start = self.start_date.as_deref().map(|s| parse_date(operation, s)).transpose()?;
        let end = self.end_date.as_deref().map(|s| parse_date(operation, s)).transpose()?;
        Ok((start, end))
    }

    fn require(&self, operation: &'static str) -> Result<(NaiveDate, NaiveDate), RevenueError> {
        match self.parse(operation)? {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(RevenueError::invalid(operation, "start_date and end_date are required")),
        }
    }
}

/// GET /api/revenue/metrics — all metrics, or those in a date range.
async fn metrics<L: Ledger, S: RevenueStore>(
    State(state): State<AppState<L, S>>,
    Query(q): Query<RangeQuery>,
) -> ApiResult<Vec<RevenueMetric>> {
    let rows = match q.parse("list_metrics")? {
        (Some(start), Some(end)) => state.engine.metrics.metrics_between(start, end).await?,
        _ => state.engine.metrics.all_metrics().await?,
    };
    Ok(Json(rows))
}

/// POST /api/revenue/metrics — store manually entered figures for a date.
async fn record_metric<L: Ledger, S: RevenueStore>(
    State(state): State<AppState<L, S>>,
    Json(input): Json<MetricInput>,
) -> ApiResult<RevenueMetric> {
    Ok(Json(state.engine.metrics.record_metric(input).await?))
}

/// POST /api/revenue/metrics/collect/:date — collect one day.
async fn collect<L: Ledger, S: RevenueStore>(
    State(state): State<AppState<L, S>>,
    Path(raw): Path<String>,
) -> ApiResult<RevenueMetric> {
    let date = parse_date("collect_metrics", &raw)?;
    Ok(Json(state.engine.metrics.collect_metrics(date).await?))
}

/// POST /api/revenue/metrics/collect-range — collect every day in a range.
async fn collect_range<L: Ledger, S: RevenueStore>(
    State(state): State<AppState<L, S>>,
    Query(q): Query<RangeQuery>,
) -> ApiResult<Vec<RevenueMetric>> {
    let (start, end) = q.require("collect_metrics_range")?;
    Ok(Json(state.engine.metrics.collect_metrics_range(start, end).await?))
}

/// GET /api/revenue/forecasts — all forecasts, or those in a date range.
async fn forecasts<L: Ledger, S: RevenueStore>(
    State(state): State<AppState<L, S>>,
    Query(q): Query<RangeQuery>,
) -> ApiResult<Vec<RevenueForecast>> {
    let rows = match q.parse("list_forecasts")? {
        (Some(start), Some(end)) => state.engine.predictions.forecasts_between(start, end).await?,
        _ => state.engine.predictions.all_forecasts().await?,
    };
    Ok(Json(rows))
}

/// POST /api/revenue/forecasts — store a hand-entered forecast.
async fn create_forecast<L: Ledger, S: RevenueStore>(
    State(state): State<AppState<L, S>>,
    Json(input): Json<ForecastInput>,
) -> ApiResult<RevenueForecast> {
    Ok(Json(state.engine.predictions.create_forecast(input).await?))
}

#[derive(Debug, Deserialize)]
struct LatestQuery {
    limit: Option<usize>,
}

/// GET /api/revenue/forecasts/latest — most recently created forecasts.
async fn latest_forecasts<L: Ledger, S: RevenueStore>(
    State(state): State<AppState<L, S>>,
    Query(q): Query<LatestQuery>,
) -> ApiResult<Vec<RevenueForecast>> {
    let limit = q.limit.unwrap_or(DEFAULT_LATEST_LIMIT);
    Ok(Json(state.engine.predictions.latest_forecasts(limit).await?))
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    start_date: String,
    end_date: String,
    model_type: Option<String>,
    prediction_type: Option<String>,
}

/// POST /api/revenue/predict — run a model over an explicit range.
async fn predict<L: Ledger, S: RevenueStore>(
    State(state): State<AppState<L, S>>,
    Json(req): Json<PredictRequest>,
) -> ApiResult<PredictionResult> {
    let start = parse_date("generate_predictions", &req.start_date)?;
    let end = parse_date("generate_predictions", &req.end_date)?;
    let model = req.model_type.as_deref().unwrap_or(DEFAULT_MODEL);
    let prediction_type = req.prediction_type.as_deref().unwrap_or(DEFAULT_PREDICTION_TYPE);

    let result = state
        .engine
        .predictions
        .generate_predictions(start, end, model, prediction_type)
        .await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct QuickQuery {
    days: Option<u32>,
    model: Option<String>,
}

/// POST /api/revenue/predict/quick — forecast the next N days.
async fn quick_predict<L: Ledger, S: RevenueStore>(
    State(state): State<AppState<L, S>>,
    Query(q): Query<QuickQuery>,
) -> ApiResult<PredictionResult> {
    let days = q.days.unwrap_or(DEFAULT_QUICK_DAYS);
    let model = q.model.as_deref().unwrap_or(DEFAULT_MODEL);
    Ok(Json(state.engine.predictions.quick_prediction(days, model).await?))
}

/// GET /api/revenue/analytics — trend and totals over a window.
async fn analytics<L: Ledger, S: RevenueStore>(
    State(state): State<AppState<L, S>>,
    Query(q): Query<RangeQuery>,
) -> ApiResult<Analytics> {
    let (start, end) = q.parse("get_analytics")?;
    Ok(Json(state.engine.analytics.get_analytics(start, end).await?))
}

/// GET /health — simple health check.
async fn health() -> &'static str {
    "ok"
}
