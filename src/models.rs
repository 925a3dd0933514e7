//! Domain records shared by every component.
//!
//! Currency is always `Decimal`; only confidence scores and statistics are `f64`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RevenueError};

/// Aggregated revenue figures for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueMetric {
    pub id: i64,
    pub date: NaiveDate,
    pub actual_revenue: Decimal,
    pub booking_count: u64,
    pub passenger_count: u64,
    pub flight_count: u64,
    pub cancellation_count: u64,
    pub average_ticket_price: Option<Decimal>,
    pub refund_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Values written by an upsert; the store owns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    pub date: NaiveDate,
    pub actual_revenue: Decimal,
    pub booking_count: u64,
    pub passenger_count: u64,
    pub flight_count: u64,
    pub cancellation_count: u64,
    pub average_ticket_price: Option<Decimal>,
    pub refund_amount: Decimal,
    pub notes: Option<String>,
}

/// Revenue divided by passengers, or `None` when nobody flew.
pub fn average_ticket_price(revenue: Decimal, passengers: u64) -> Option<Decimal> {
    if passengers == 0 {
        return None;
    }
    Some((revenue / Decimal::from(passengers)).round_dp(2))
}

/// Granularity label attached to a forecast run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl PredictionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for PredictionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredictionType {
    type Err = RevenueError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(RevenueError::invalid(
                "parse_prediction_type",
                format!("unknown prediction type '{other}'"),
            )),
        }
    }
}

/// A stored prediction for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueForecast {
    pub id: i64,
    pub forecast_date: NaiveDate,
    pub predicted_revenue: Decimal,
    pub actual_revenue: Option<Decimal>,
    pub confidence_score: f64,
    pub model_used: String,
    pub model_version: String,
    pub prediction_type: PredictionType,
    pub features_used: serde_json::Value,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RevenueForecast {
    /// Copy of this forecast with the realised revenue filled in.
    pub fn with_actual_revenue(&self, actual: Decimal) -> Self {
        Self {
            actual_revenue: Some(actual),
            ..self.clone()
        }
    }

    /// Absolute percentage error against the realised revenue, when known and nonzero.
    pub fn absolute_percentage_error(&self) -> Option<f64> {
        let actual = self.actual_revenue?;
        if actual.is_zero() {
            return None;
        }
        let err = ((self.predicted_revenue - actual) / actual).abs();
        err.to_f64().map(|e| e * 100.0)
    }
}

/// A forecast produced by a model, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRevenueForecast {
    pub forecast_date: NaiveDate,
    pub predicted_revenue: Decimal,
    pub actual_revenue: Option<Decimal>,
    pub confidence_score: f64,
    pub model_used: String,
    pub model_version: String,
    pub prediction_type: PredictionType,
    pub features_used: serde_json::Value,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewRevenueForecast {
    pub fn into_stored(self, id: i64) -> RevenueForecast {
        RevenueForecast {
            id,
            forecast_date: self.forecast_date,
            predicted_revenue: self.predicted_revenue,
            actual_revenue: self.actual_revenue,
            confidence_score: self.confidence_score,
            model_used: self.model_used,
            model_version: self.model_version,
            prediction_type: self.prediction_type,
            features_used: self.features_used,
            notes: self.notes,
            created_at: self.created_at,
        }
    }
}

/// Convert a statistic back to currency, floored at zero and rounded to cents.
pub fn to_currency(value: f64) -> Decimal {
    if !value.is_finite() || value <= 0.0 {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).unwrap_or_default().round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ticket_price_guards_zero_passengers() {
        assert_eq!(average_ticket_price(dec!(1000), 0), None);
        assert_eq!(average_ticket_price(dec!(1000), 3), Some(dec!(333.33)));
    }

    #[test]
    fn prediction_type_parsing() {
        assert_eq!("weekly".parse::<PredictionType>().unwrap(), PredictionType::Weekly);
        let err = "hourly".parse::<PredictionType>().unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn currency_conversion_floors_and_rounds() {
        assert_eq!(to_currency(-12.5), Decimal::ZERO);
        assert_eq!(to_currency(f64::NAN), Decimal::ZERO);
        assert_eq!(to_currency(1234.5678), dec!(1234.57));
    }

    #[test]
    fn backfill_returns_new_record() {
        let original = NewRevenueForecast {
            forecast_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            predicted_revenue: dec!(900),
            actual_revenue: None,
            confidence_score: 80.0,
            model_used: "moving_average".into(),
            model_version: "1.0".into(),
            prediction_type: PredictionType::Daily,
            features_used: serde_json::json!({}),
            notes: None,
            created_at: Utc::now(),
        }
        .into_stored(1);

        let updated = original.with_actual_revenue(dec!(1000));
        assert_eq!(original.actual_revenue, None);
        assert_eq!(updated.actual_revenue, Some(dec!(1000)));
        assert!((updated.absolute_percentage_error().unwrap() - 10.0).abs() < 1e-9);
    }
}
