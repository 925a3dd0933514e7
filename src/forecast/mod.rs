//! Revenue forecast models.
//!
//! Each model is a pure function from an ordered history to one forecast per
//! day of the horizon, dated `as_of + 1 ..= as_of + horizon_days`. Models that
//! lack enough history degrade to the moving average and say so in
//! `features_used` and `notes`.

pub mod growth;
pub mod linear;
pub mod moving_average;
pub mod stats;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;
use crate::error::{Result, RevenueError};
use crate::models::{to_currency, NewRevenueForecast, PredictionType, RevenueMetric};

/// The closed set of forecasting strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LinearRegression,
    MovingAverage,
    GrowthBased,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [Self::LinearRegression, Self::MovingAverage, Self::GrowthBased];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinearRegression => "linear_regression",
            Self::MovingAverage => "moving_average",
            Self::GrowthBased => "growth_based",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = RevenueError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                RevenueError::invalid("parse_model_type", format!("unknown model type '{s}'"))
            })
    }
}

/// Tunables shared by all models.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub window: usize,
    pub default_daily_revenue: Decimal,
    pub insufficient_data_confidence: f64,
    pub model_version: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::from(&ForecastConfig::default())
    }
}

impl From<&ForecastConfig> for ModelSettings {
    fn from(cfg: &ForecastConfig) -> Self {
        Self {
            window: cfg.moving_average_window.max(1),
            default_daily_revenue: cfg.default_daily_revenue,
            insufficient_data_confidence: cfg.insufficient_data_confidence,
            model_version: cfg.model_version.clone(),
        }
    }
}

/// Everything a model needs besides the history itself.
#[derive(Debug, Clone)]
pub struct ForecastContext {
    /// Forecasts start the day after this date.
    pub as_of: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub prediction_type: PredictionType,
    pub settings: ModelSettings,
}

impl ForecastContext {
    pub fn new(as_of: NaiveDate, created_at: DateTime<Utc>) -> Self {
        Self {
            as_of,
            created_at,
            prediction_type: PredictionType::Daily,
            settings: ModelSettings::default(),
        }
    }

    pub fn with_prediction_type(mut self, prediction_type: PredictionType) -> Self {
        self.prediction_type = prediction_type;
        self
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Date of the `day`-th forecast (1-based).
    fn date_for(&self, day: u32) -> NaiveDate {
        self.as_of + Duration::days(i64::from(day))
    }

    fn build(
        &self,
        day: u32,
        value: f64,
        confidence: f64,
        model: ModelKind,
        features: &serde_json::Value,
        notes: Option<&str>,
    ) -> NewRevenueForecast {
        NewRevenueForecast {
            forecast_date: self.date_for(day),
            predicted_revenue: to_currency(value),
            actual_revenue: None,
            confidence_score: clamp_confidence(confidence),
            model_used: model.as_str().to_string(),
            model_version: self.settings.model_version.clone(),
            prediction_type: self.prediction_type,
            features_used: features.clone(),
            notes: notes.map(str::to_string),
            created_at: self.created_at,
        }
    }
}

/// Why a model handed over to the moving average.
#[derive(Debug, Clone)]
pub(crate) struct Fallback {
    pub requested: ModelKind,
    pub reason: String,
}

/// Run `kind` over `history` (oldest first) for `horizon_days` days.
pub fn predict(
    kind: ModelKind,
    history: &[RevenueMetric],
    horizon_days: u32,
    ctx: &ForecastContext,
) -> Vec<NewRevenueForecast> {
    match kind {
        ModelKind::LinearRegression => linear::predict(history, horizon_days, ctx),
        ModelKind::MovingAverage => moving_average::predict(history, horizon_days, ctx),
        ModelKind::GrowthBased => growth::predict(history, horizon_days, ctx),
    }
}

fn revenues(history: &[RevenueMetric]) -> Vec<f64> {
    history
        .iter()
        .map(|m| m.actual_revenue.to_f64().unwrap_or(0.0).max(0.0))
        .collect()
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(n)
    }

    /// Consecutive metrics starting 2024-01-01.
    pub fn history(revenues: &[f64]) -> Vec<RevenueMetric> {
        revenues
            .iter()
            .enumerate()
            .map(|(i, r)| RevenueMetric {
                id: i as i64 + 1,
                date: day(i as i64),
                actual_revenue: Decimal::from_f64(*r).unwrap(),
                booking_count: 0,
                passenger_count: 0,
                flight_count: 0,
                cancellation_count: 0,
                average_ticket_price: None,
                refund_amount: Decimal::ZERO,
                notes: None,
                created_at: Utc::now(),
            })
            .collect()
    }

    pub fn ctx(as_of: NaiveDate) -> ForecastContext {
        ForecastContext::new(as_of, Utc::now())
    }

    pub fn assert_contiguous(forecasts: &[NewRevenueForecast], as_of: NaiveDate, horizon: u32) {
        assert_eq!(forecasts.len(), horizon as usize);
        for (i, f) in forecasts.iter().enumerate() {
            assert_eq!(f.forecast_date, as_of + Duration::days(i as i64 + 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn model_names_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
        }
        assert!("arima".parse::<ModelKind>().unwrap_err().is_invalid_input());
    }

    #[test]
    fn every_model_is_non_negative_and_contiguous() {
        let as_of = day(29);
        let cases: Vec<Vec<f64>> = vec![
            vec![],
            vec![0.0; 30],
            (0..30).map(|i| 3000.0 - i as f64 * 400.0).map(|v: f64| v.max(0.0)).collect(),
            (0..30).map(|i| if i % 2 == 0 { 0.0 } else { 9000.0 }).collect(),
        ];

        for revenues in cases {
            let hist = history(&revenues);
            for kind in ModelKind::ALL {
                let out = predict(kind, &hist, 21, &ctx(as_of));
                assert_contiguous(&out, as_of, 21);
                for f in &out {
                    assert!(f.predicted_revenue >= Decimal::ZERO, "{kind} went negative");
                    assert!((0.0..=100.0).contains(&f.confidence_score));
                }
            }
        }
    }
}
