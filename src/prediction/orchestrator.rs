//! Prediction orchestrator — validates a request, runs a model, persists the run.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::Clock;
use crate::config::ForecastConfig;
use crate::error::{Result, RevenueError};
use crate::forecast::{self, ForecastContext, ModelKind, ModelSettings};
use crate::metrics::offset_date;
use crate::models::{NewRevenueForecast, PredictionType, RevenueForecast};
use crate::store::RevenueStore;

#[derive(Debug, Clone, Serialize)]
pub struct PredictionSummary {
    pub total_predicted_revenue: Decimal,
    pub average_daily_revenue: Decimal,
    pub prediction_count: usize,
    pub date_range: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_type: ModelKind,
    pub prediction_type: PredictionType,
    pub average_confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub predictions: Vec<RevenueForecast>,
    pub metrics: PredictionSummary,
    pub model_info: ModelInfo,
    /// 100 minus the mean absolute percentage error, where actuals are already known.
    pub accuracy: Option<f64>,
}

/// Manually supplied forecast.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastInput {
    pub forecast_date: NaiveDate,
    pub predicted_revenue: Decimal,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub prediction_type: Option<PredictionType>,
    #[serde(default)]
    pub notes: Option<String>,
}

pub struct PredictionOrchestrator<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: ForecastConfig,
}

impl<S: RevenueStore> PredictionOrchestrator<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: ForecastConfig) -> Self {
        Self { store, clock, config }
    }

    /// Forecast every day in `start..=end` with the named model and persist the run.
    pub async fn generate_predictions(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        model_type: &str,
        prediction_type: &str,
    ) -> Result<PredictionResult> {
        const OP: &str = "generate_predictions";

        let model: ModelKind = model_type
            .parse()
            .map_err(|_| RevenueError::invalid(OP, format!("unknown model_type '{model_type}'")))?;
        let prediction_type: PredictionType = prediction_type.parse().map_err(|_| {
            RevenueError::invalid(OP, format!("unknown prediction_type '{prediction_type}'"))
        })?;

        let horizon = (end - start).num_days() + 1;
        if horizon < 1 {
            return Err(RevenueError::invalid(
                OP,
                format!("end_date {end} is before start_date {start}"),
            ));
        }
        if horizon > self.config.max_horizon_days {
            return Err(RevenueError::invalid(
                OP,
                format!(
                    "horizon of {horizon} days ({start}..{end}) exceeds the maximum of {}",
                    self.config.max_horizon_days
                ),
            ));
        }
        let horizon_days = u32::try_from(horizon)
            .map_err(|_| RevenueError::invalid(OP, format!("horizon of {horizon} days is too large")))?;

        let as_of = offset_date(OP, start, -1)?;
        let history_start = offset_date(OP, start, -self.config.history_days.max(1))?;
        let history = self.store.metrics_between(history_start, as_of).await?;

        let ctx = ForecastContext::new(as_of, self.clock.now())
            .with_prediction_type(prediction_type)
            .with_settings(ModelSettings::from(&self.config));
        let drafts = forecast::predict(model, &history, horizon_days, &ctx);

        let predictions = self.store.insert_forecasts(drafts).await?;
        let accuracy = self.accuracy(&predictions, start, end).await?;

        let result = summarize(predictions, model, prediction_type, start, end, accuracy);
        info!(
            model = %model,
            %start,
            %end,
            history = history.len(),
            total = %result.metrics.total_predicted_revenue,
            confidence = result.model_info.average_confidence,
            "predictions generated"
        );
        Ok(result)
    }

    /// Forecast the next `days` days from today.
    pub async fn quick_prediction(&self, days: u32, model_type: &str) -> Result<PredictionResult> {
        const OP: &str = "quick_prediction";

        if days == 0 {
            return Err(RevenueError::invalid(OP, "days must be at least 1"));
        }
        if i64::from(days) > self.config.max_horizon_days {
            return Err(RevenueError::invalid(
                OP,
                format!("{days} days exceeds the maximum of {}", self.config.max_horizon_days),
            ));
        }
        let today = self.clock.today();
        let start = offset_date(OP, today, 1)?;
        let end = offset_date(OP, today, i64::from(days))?;
        self.generate_predictions(start, end, model_type, PredictionType::Daily.as_str())
            .await
    }

    /// Store a single forecast entered by hand.
    pub async fn create_forecast(&self, input: ForecastInput) -> Result<RevenueForecast> {
        const OP: &str = "create_forecast";

        if input.predicted_revenue < Decimal::ZERO {
            return Err(RevenueError::invalid(
                OP,
                format!("predicted_revenue for {} is negative", input.forecast_date),
            ));
        }
        let confidence = input.confidence_score.unwrap_or(0.0);
        if !(0.0..=100.0).contains(&confidence) {
            return Err(RevenueError::invalid(
                OP,
                format!("confidence_score {confidence} is outside 0..=100"),
            ));
        }

        let draft = NewRevenueForecast {
            forecast_date: input.forecast_date,
            predicted_revenue: input.predicted_revenue.round_dp(2),
            actual_revenue: None,
            confidence_score: confidence,
            model_used: input.model_used.unwrap_or_else(|| "manual".to_string()),
            model_version: self.config.model_version.clone(),
            prediction_type: input.prediction_type.unwrap_or(PredictionType::Daily),
            features_used: serde_json::json!({}),
            notes: input.notes,
            created_at: self.clock.now(),
        };
        let mut stored = self.store.insert_forecasts(vec![draft]).await?;
        stored.pop().ok_or(RevenueError::Database(sqlx::Error::RowNotFound))
    }

    pub async fn latest_forecasts(&self, limit: usize) -> Result<Vec<RevenueForecast>> {
        self.store.latest_forecasts(limit).await
    }

    pub async fn forecasts_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RevenueForecast>> {
        if end < start {
            return Err(RevenueError::invalid(
                "forecasts_between",
                format!("end_date {end} is before start_date {start}"),
            ));
        }
        self.store.forecasts_between(start, end).await
    }

    pub async fn all_forecasts(&self) -> Result<Vec<RevenueForecast>> {
        self.store.all_forecasts().await
    }

    /// Fill in `actual_revenue` for forecasts whose date now has a metric.
    pub async fn backfill_actuals(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RevenueForecast>> {
        let forecasts = self.forecasts_between(start, end).await?;
        let actuals = self.actuals_by_date(start, end).await?;

        let mut updated = Vec::new();
        for f in forecasts.iter().filter(|f| f.actual_revenue.is_none()) {
            let Some(actual) = actuals.get(&f.forecast_date) else {
                continue;
            };
            if let Some(row) = self.store.set_actual_revenue(f.id, *actual).await? {
                updated.push(row);
            }
        }
        info!(%start, %end, updated = updated.len(), "forecast actuals backfilled");
        Ok(updated)
    }

    async fn actuals_by_date(&self, start: NaiveDate, end: NaiveDate) -> Result<HashMap<NaiveDate, Decimal>> {
        let metrics = self.store.metrics_between(start, end).await?;
        Ok(metrics.into_iter().map(|m| (m.date, m.actual_revenue)).collect())
    }

    async fn accuracy(
        &self,
        predictions: &[RevenueForecast],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<f64>> {
        let actuals = self.actuals_by_date(start, end).await?;
        if actuals.is_empty() {
            return Ok(None);
        }
        let errors: Vec<f64> = predictions
            .iter()
            .filter_map(|p| {
                let actual = actuals.get(&p.forecast_date)?;
                p.with_actual_revenue(*actual).absolute_percentage_error()
            })
            .collect();
        Ok(accuracy_from_errors(&errors))
    }
}

fn accuracy_from_errors(errors: &[f64]) -> Option<f64> {
    if errors.is_empty() {
        return None;
    }
    let mape = errors.iter().sum::<f64>() / errors.len() as f64;
    Some((100.0 - mape).max(0.0))
}

fn summarize(
    predictions: Vec<RevenueForecast>,
    model: ModelKind,
    prediction_type: PredictionType,
    start: NaiveDate,
    end: NaiveDate,
    accuracy: Option<f64>,
) -> PredictionResult {
    let count = predictions.len();
    let total: Decimal = predictions.iter().map(|p| p.predicted_revenue).sum();
    let average_daily = if count == 0 {
        Decimal::ZERO
    } else {
        (total / Decimal::from(count)).round_dp(2)
    };
    let average_confidence = if count == 0 {
        0.0
    } else {
        predictions.iter().map(|p| p.confidence_score).sum::<f64>() / count as f64
    };

    PredictionResult {
        predictions,
        metrics: PredictionSummary {
            total_predicted_revenue: total,
            average_daily_revenue: average_daily,
            prediction_count: count,
            date_range: format!("{start} to {end}"),
        },
        model_info: ModelInfo {
            model_type: model,
            prediction_type,
            average_confidence,
        },
        accuracy,
    }
}
