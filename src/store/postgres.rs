//! Store backed by the `revenue_metrics` / `revenue_forecasts` tables.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RevenueStore;
use crate::db::queries;
use crate::error::Result;
use crate::models::{MetricValues, NewRevenueForecast, RevenueForecast, RevenueMetric};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

impl RevenueStore for PgStore {
    async fn upsert_metric(&self, values: MetricValues) -> Result<RevenueMetric> {
        queries::upsert_metric(&self.db, &values).await
    }

    async fn metrics_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RevenueMetric>> {
        queries::get_metrics_between(&self.db, start, end).await
    }

    async fn all_metrics(&self) -> Result<Vec<RevenueMetric>> {
        queries::get_all_metrics(&self.db).await
    }

    async fn average_ticket_price(&self, start: NaiveDate, end: NaiveDate) -> Result<Option<Decimal>> {
        queries::get_average_ticket_price(&self.db, start, end).await
    }

    async fn insert_forecasts(&self, batch: Vec<NewRevenueForecast>) -> Result<Vec<RevenueForecast>> {
        queries::insert_forecasts(&self.db, &batch).await
    }

    async fn forecasts_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RevenueForecast>> {
        queries::get_forecasts_between(&self.db, start, end).await
    }

    async fn all_forecasts(&self) -> Result<Vec<RevenueForecast>> {
        queries::get_all_forecasts(&self.db).await
    }

    async fn latest_forecasts(&self, limit: usize) -> Result<Vec<RevenueForecast>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        queries::get_latest_forecasts(&self.db, limit).await
    }

    async fn set_actual_revenue(&self, forecast_id: i64, actual: Decimal) -> Result<Option<RevenueForecast>> {
        queries::set_forecast_actual(&self.db, forecast_id, actual).await
    }
}
