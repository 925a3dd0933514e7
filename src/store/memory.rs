//! In-memory store with the same upsert and batch semantics as Postgres.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;

use super::RevenueStore;
use crate::error::Result;
use crate::models::{MetricValues, NewRevenueForecast, RevenueForecast, RevenueMetric};

#[derive(Debug, Default)]
struct State {
    /// Keyed by date, which enforces one metric per day.
    metrics: BTreeMap<NaiveDate, RevenueMetric>,
    forecasts: Vec<RevenueForecast>,
    next_metric_id: i64,
    next_forecast_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metric_count(&self) -> usize {
        self.state.read().metrics.len()
    }

    pub fn forecast_count(&self) -> usize {
        self.state.read().forecasts.len()
    }
}

impl RevenueStore for MemoryStore {
    async fn upsert_metric(&self, values: MetricValues) -> Result<RevenueMetric> {
        let mut state = self.state.write();
        let existing = state.metrics.get(&values.date).map(|m| (m.id, m.created_at, m.notes.clone()));

        let (id, created_at, previous_notes) = match existing {
            Some(found) => found,
            None => {
                state.next_metric_id += 1;
                (state.next_metric_id, Utc::now(), None)
            }
        };

        let metric = RevenueMetric {
            id,
            date: values.date,
            actual_revenue: values.actual_revenue,
            booking_count: values.booking_count,
            passenger_count: values.passenger_count,
            flight_count: values.flight_count,
            cancellation_count: values.cancellation_count,
            average_ticket_price: values.average_ticket_price,
            refund_amount: values.refund_amount,
            notes: values.notes.or(previous_notes),
            created_at,
        };
        state.metrics.insert(metric.date, metric.clone());
        Ok(metric)
    }

    async fn metrics_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RevenueMetric>> {
        if start > end {
            return Ok(Vec::new());
        }
        let state = self.state.read();
        Ok(state.metrics.range(start..=end).map(|(_, m)| m.clone()).collect())
    }

    async fn all_metrics(&self) -> Result<Vec<RevenueMetric>> {
        Ok(self.state.read().metrics.values().cloned().collect())
    }

    async fn average_ticket_price(&self, start: NaiveDate, end: NaiveDate) -> Result<Option<Decimal>> {
        if start > end {
            return Ok(None);
        }
        let state = self.state.read();
        let prices: Vec<Decimal> = state
            .metrics
            .range(start..=end)
            .filter_map(|(_, m)| m.average_ticket_price)
            .collect();
        if prices.is_empty() {
            return Ok(None);
        }
        let total: Decimal = prices.iter().sum();
        Ok(Some((total / Decimal::from(prices.len())).round_dp(2)))
    }

    async fn insert_forecasts(&self, batch: Vec<NewRevenueForecast>) -> Result<Vec<RevenueForecast>> {
        let mut state = self.state.write();
        let mut stored = Vec::with_capacity(batch.len());
        for f in batch {
            state.next_forecast_id += 1;
            stored.push(f.into_stored(state.next_forecast_id));
        }
        state.forecasts.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn forecasts_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RevenueForecast>> {
        let state = self.state.read();
        let mut rows: Vec<RevenueForecast> = state
            .forecasts
            .iter()
            .filter(|f| f.forecast_date >= start && f.forecast_date <= end)
            .cloned()
            .collect();
        rows.sort_by_key(|f| (f.forecast_date, f.id));
        Ok(rows)
    }

    async fn all_forecasts(&self) -> Result<Vec<RevenueForecast>> {
        let mut rows = self.state.read().forecasts.clone();
        rows.sort_by_key(|f| (f.forecast_date, f.id));
        Ok(rows)
    }

    async fn latest_forecasts(&self, limit: usize) -> Result<Vec<RevenueForecast>> {
        let mut rows = self.state.read().forecasts.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn set_actual_revenue(&self, forecast_id: i64, actual: Decimal) -> Result<Option<RevenueForecast>> {
        let mut state = self.state.write();
        let Some(slot) = state.forecasts.iter_mut().find(|f| f.id == forecast_id) else {
            return Ok(None);
        };
        let updated = slot.with_actual_revenue(actual);
        *slot = updated.clone();
        Ok(Some(updated))
    }
}
