//! Persistence for metrics and forecasts.

pub mod memory;
pub mod postgres;

use std::future::Future;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{MetricValues, NewRevenueForecast, RevenueForecast, RevenueMetric};

pub trait RevenueStore: Send + Sync + 'static {
    /// Insert or replace the metric for `values.date`; at most one row per date.
    fn upsert_metric(&self, values: MetricValues) -> impl Future<Output = Result<RevenueMetric>> + Send;

    /// Metrics with `start <= date <= end`, oldest first.
    fn metrics_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<RevenueMetric>>> + Send;

    fn all_metrics(&self) -> impl Future<Output = Result<Vec<RevenueMetric>>> + Send;

    /// Mean of the non-null ticket prices in the range.
    fn average_ticket_price(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Option<Decimal>>> + Send;

    /// Persist a forecast run. Either every row is stored or none is.
    fn insert_forecasts(
        &self,
        batch: Vec<NewRevenueForecast>,
    ) -> impl Future<Output = Result<Vec<RevenueForecast>>> + Send;

    fn forecasts_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<RevenueForecast>>> + Send;

    fn all_forecasts(&self) -> impl Future<Output = Result<Vec<RevenueForecast>>> + Send;

    /// Most recently created forecasts first.
    fn latest_forecasts(&self, limit: usize) -> impl Future<Output = Result<Vec<RevenueForecast>>> + Send;

    /// Record the realised revenue for a forecast, returning the updated row.
    fn set_actual_revenue(
        &self,
        forecast_id: i64,
        actual: Decimal,
    ) -> impl Future<Output = Result<Option<RevenueForecast>>> + Send;
}
