//! Database row types for the revenue tables.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use crate::error::{Result, RevenueError};
use crate::models::{PredictionType, RevenueForecast, RevenueMetric};

#[derive(Debug, Clone, FromRow)]
pub struct DbRevenueMetric {
    pub metric_id: i64,
    pub date: NaiveDate,
    pub actual_revenue: Decimal,
    pub booking_count: i64,
    pub passenger_count: i64,
    pub flight_count: i64,
    pub cancellation_count: i64,
    pub average_ticket_price: Option<Decimal>,
    pub refund_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbRevenueMetric> for RevenueMetric {
    fn from(row: DbRevenueMetric) -> Self {
        Self {
            id: row.metric_id,
            date: row.date,
            actual_revenue: row.actual_revenue,
            booking_count: count(row.booking_count),
            passenger_count: count(row.passenger_count),
            flight_count: count(row.flight_count),
            cancellation_count: count(row.cancellation_count),
            average_ticket_price: row.average_ticket_price,
            refund_amount: row.refund_amount,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbRevenueForecast {
    pub forecast_id: i64,
    pub forecast_date: NaiveDate,
    pub predicted_revenue: Decimal,
    pub actual_revenue: Option<Decimal>,
    pub confidence_score: f64,
    pub model_used: String,
    pub model_version: String,
    pub prediction_type: String,
    pub features_used: serde_json::Value,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbRevenueForecast> for RevenueForecast {
    type Error = RevenueError;

    fn try_from(row: DbRevenueForecast) -> Result<Self> {
        let prediction_type: PredictionType = row.prediction_type.parse()?;
        Ok(Self {
            id: row.forecast_id,
            forecast_date: row.forecast_date,
            predicted_revenue: row.predicted_revenue,
            actual_revenue: row.actual_revenue,
            confidence_score: row.confidence_score,
            model_used: row.model_used,
            model_version: row.model_version,
            prediction_type,
            features_used: row.features_used,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
