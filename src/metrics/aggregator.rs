//! Metrics aggregator — turns a day of ledger activity into a stored metric.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, RevenueError};
use crate::ledger::Ledger;
use crate::models::{average_ticket_price, MetricValues, RevenueMetric};
use crate::store::RevenueStore;

/// Manually supplied figures for one date.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricInput {
    pub date: NaiveDate,
    pub actual_revenue: Decimal,
    #[serde(default)]
    pub booking_count: u64,
    #[serde(default)]
    pub passenger_count: u64,
    #[serde(default)]
    pub flight_count: u64,
    #[serde(default)]
    pub cancellation_count: u64,
    #[serde(default)]
    pub refund_amount: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

pub struct MetricsAggregator<L, S> {
    ledger: Arc<L>,
    store: Arc<S>,
}

impl<L: Ledger, S: RevenueStore> MetricsAggregator<L, S> {
    pub fn new(ledger: Arc<L>, store: Arc<S>) -> Self {
        Self { ledger, store }
    }

    /// Collect and upsert the metric for `target_date`. Safe to repeat.
    pub async fn collect_metrics(&self, target_date: NaiveDate) -> Result<RevenueMetric> {
        let activity = self.ledger.daily_activity(target_date).await?;

        let values = MetricValues {
            date: target_date,
            actual_revenue: activity.successful_payments,
            booking_count: activity.confirmed_bookings,
            passenger_count: activity.passengers,
            flight_count: activity.departing_flights,
            cancellation_count: activity.cancelled_bookings,
            average_ticket_price: average_ticket_price(activity.successful_payments, activity.passengers),
            refund_amount: activity.refunds_requested,
            notes: None,
        };

        let metric = self.store.upsert_metric(values).await?;
        info!(
            date = %metric.date,
            revenue = %metric.actual_revenue,
            bookings = metric.booking_count,
            passengers = metric.passenger_count,
            "metrics collected"
        );
        Ok(metric)
    }

    /// Collect every day in `start..=end`, one after another.
    pub async fn collect_metrics_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RevenueMetric>> {
        if end < start {
            return Err(RevenueError::invalid(
                "collect_metrics_range",
                format!("end_date {end} is before start_date {start}"),
            ));
        }

        let mut collected = Vec::new();
        let mut date = start;
        while date <= end {
            collected.push(self.collect_metrics(date).await?);
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        debug!(%start, %end, days = collected.len(), "metrics range collected");
        Ok(collected)
    }

    /// Store manually entered figures, replacing any metric for that date.
    pub async fn record_metric(&self, input: MetricInput) -> Result<RevenueMetric> {
        if input.actual_revenue < Decimal::ZERO {
            return Err(RevenueError::invalid(
                "record_metric",
                format!("actual_revenue for {} is negative: {}", input.date, input.actual_revenue),
            ));
        }
        if input.refund_amount < Decimal::ZERO {
            return Err(RevenueError::invalid(
                "record_metric",
                format!("refund_amount for {} is negative: {}", input.date, input.refund_amount),
            ));
        }

        let actual_revenue = input.actual_revenue.round_dp(2);
        let values = MetricValues {
            date: input.date,
            actual_revenue,
            booking_count: input.booking_count,
            passenger_count: input.passenger_count,
            flight_count: input.flight_count,
            cancellation_count: input.cancellation_count,
            average_ticket_price: average_ticket_price(actual_revenue, input.passenger_count),
            refund_amount: input.refund_amount.round_dp(2),
            notes: input.notes,
        };
        let metric = self.store.upsert_metric(values).await?;
        info!(date = %metric.date, revenue = %metric.actual_revenue, "metric recorded");
        Ok(metric)
    }

    pub async fn metrics_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RevenueMetric>> {
        if end < start {
            return Err(RevenueError::invalid(
                "metrics_between",
                format!("end_date {end} is before start_date {start}"),
            ));
        }
        self.store.metrics_between(start, end).await
    }

    pub async fn all_metrics(&self) -> Result<Vec<RevenueMetric>> {
        self.store.all_metrics().await
    }
}

/// Move `date` by `days`, rejecting results outside chrono's calendar range.
pub fn offset_date(operation: &'static str, date: NaiveDate, days: i64) -> Result<NaiveDate> {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| RevenueError::invalid(operation, format!("{date} shifted by {days} days is out of range")))
}

/// Parse a `YYYY-MM-DD` date, naming the operation on failure.
pub fn parse_date(operation: &'static str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| RevenueError::invalid(operation, format!("invalid date '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::memory::{Booking, BookingStatus, MemoryLedger, Passenger, Payment, PaymentStatus, Refund};
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDateTime;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        date(s).and_hms_opt(10, 30, 0).unwrap()
    }

    fn seeded() -> (Arc<MemoryLedger>, Arc<MemoryStore>) {
        let ledger = MemoryLedger::new();
        ledger.add_booking(Booking { booking_id: 1, booking_date: at("2024-02-10"), status: BookingStatus::Confirmed });
        ledger.add_booking(Booking { booking_id: 2, booking_date: at("2024-02-10"), status: BookingStatus::Confirmed });
        ledger.add_booking(Booking { booking_id: 3, booking_date: at("2024-02-10"), status: BookingStatus::Cancelled });
        ledger.add_payment(Payment { payment_id: 1, booking_id: 1, amount: dec!(600.00), payment_date: at("2024-02-10"), status: PaymentStatus::Success });
        ledger.add_payment(Payment { payment_id: 2, booking_id: 2, amount: dec!(400.00), payment_date: at("2024-02-10"), status: PaymentStatus::Success });
        ledger.add_payment(Payment { payment_id: 3, booking_id: 3, amount: dec!(999.00), payment_date: at("2024-02-10"), status: PaymentStatus::Pending });
        for (pid, bid) in [(1, 1), (2, 1), (3, 2)] {
            ledger.add_passenger(Passenger { passenger_id: pid, booking_id: bid });
        }
        ledger.add_refund(Refund { refund_id: 1, booking_id: 3, refund_amount: dec!(150.00), requested_at: at("2024-02-10") });
        (Arc::new(ledger), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn collects_daily_figures() {
        let (ledger, store) = seeded();
        let agg = MetricsAggregator::new(ledger, store);

        let m = agg.collect_metrics(date("2024-02-10")).await.unwrap();
        assert_eq!(m.actual_revenue, dec!(1000.00));
        assert_eq!(m.booking_count, 2);
        assert_eq!(m.passenger_count, 3);
        assert_eq!(m.cancellation_count, 1);
        assert_eq!(m.refund_amount, dec!(150.00));
        assert_eq!(m.average_ticket_price, Some(dec!(333.33)));
    }

    #[tokio::test]
    async fn collecting_twice_is_idempotent() {
        let (ledger, store) = seeded();
        let agg = MetricsAggregator::new(ledger, store.clone());

        let first = agg.collect_metrics(date("2024-02-10")).await.unwrap();
        let second = agg.collect_metrics(date("2024-02-10")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.metric_count(), 1);
    }

    #[tokio::test]
    async fn quiet_day_yields_zero_metric() {
        let (ledger, store) = seeded();
        let agg = MetricsAggregator::new(ledger, store);

        let m = agg.collect_metrics(date("2024-02-11")).await.unwrap();
        assert!(m.actual_revenue.is_zero());
        assert_eq!(m.passenger_count, 0);
        assert_eq!(m.average_ticket_price, None);
    }

    #[tokio::test]
    async fn range_collects_each_day_once() {
        let (ledger, store) = seeded();
        let agg = MetricsAggregator::new(ledger, store.clone());

        let rows = agg.collect_metrics_range(date("2024-02-08"), date("2024-02-12")).await.unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[2].actual_revenue, dec!(1000.00));
        agg.collect_metrics_range(date("2024-02-10"), date("2024-02-12")).await.unwrap();
        assert_eq!(store.metric_count(), 5);

        let err = agg.collect_metrics_range(date("2024-02-12"), date("2024-02-08")).await.unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn record_metric_rejects_negative_revenue() {
        let (ledger, store) = seeded();
        let agg = MetricsAggregator::new(ledger, store.clone());

        let err = agg
            .record_metric(MetricInput {
                date: date("2024-02-01"),
                actual_revenue: dec!(-1),
                booking_count: 0,
                passenger_count: 0,
                flight_count: 0,
                cancellation_count: 0,
                refund_amount: Decimal::ZERO,
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(store.metric_count(), 0);
    }

    #[tokio::test]
    async fn range_ending_on_last_calendar_day_terminates() {
        let (ledger, store) = seeded();
        let agg = MetricsAggregator::new(ledger, store.clone());

        let start = NaiveDate::MAX.pred_opt().unwrap();
        let rows = agg.collect_metrics_range(start, NaiveDate::MAX).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].date, NaiveDate::MAX);
    }

    #[tokio::test]
    async fn record_metric_rounds_amounts_to_cents() {
        let (ledger, store) = seeded();
        let agg = MetricsAggregator::new(ledger, store);

        let m = agg
            .record_metric(MetricInput {
                date: date("2024-02-01"),
                actual_revenue: dec!(1000.005),
                booking_count: 3,
                passenger_count: 3,
                flight_count: 1,
                cancellation_count: 0,
                refund_amount: dec!(12.3456),
                notes: Some("manual".into()),
            })
            .await
            .unwrap();
        assert_eq!(m.actual_revenue, dec!(1000.00));
        assert_eq!(m.refund_amount, dec!(12.35));
        assert_eq!(m.average_ticket_price, Some(dec!(333.33)));
    }

    #[test]
    fn offset_date_rejects_out_of_range_results() {
        assert_eq!(offset_date("quick_prediction", date("2024-02-28"), 2).unwrap(), date("2024-03-01"));
        let err = offset_date("quick_prediction", NaiveDate::MIN, -1).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(offset_date("quick_prediction", date("2024-01-01"), i64::MAX).is_err());
    }

    #[test]
    fn parse_date_reports_operation() {
        assert_eq!(parse_date("collect_metrics", "2024-01-31").unwrap(), date("2024-01-31"));
        let err = parse_date("collect_metrics", "2024-02-31").unwrap_err();
        assert!(err.to_string().contains("collect_metrics"));
    }
}
