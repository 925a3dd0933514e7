//! Analytics reporter — totals, trend and extremes over a window of metrics.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::config::AnalyticsConfig;
use crate::error::{Result, RevenueError};
use crate::metrics::offset_date;
use crate::models::RevenueMetric;
use crate::store::RevenueStore;

/// Half-over-half change, in percent, beyond which a window is trending.
const TREND_THRESHOLD_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn classify(growth_rate: f64) -> Self {
        if growth_rate > TREND_THRESHOLD_PCT {
            Self::Increasing
        } else if growth_rate < -TREND_THRESHOLD_PCT {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_revenue: Decimal,
    pub average_daily_revenue: Decimal,
    pub total_bookings: u64,
    pub total_passengers: u64,
    pub average_ticket_price: Decimal,
    /// Percent change of the second half's average over the first half's.
    pub growth_rate: f64,
    pub trend: Trend,
    pub best_day: Option<NaiveDate>,
    pub worst_day: Option<NaiveDate>,
}

pub struct AnalyticsReporter<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: AnalyticsConfig,
}

impl<S: RevenueStore> AnalyticsReporter<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: AnalyticsConfig) -> Self {
        Self { store, clock, config }
    }

    /// Report over `start..=end`; end defaults to today and start to the
    /// configured window before end.
    pub async fn get_analytics(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Analytics> {
        let end = end.unwrap_or_else(|| self.clock.today());
        let start = match start {
            Some(start) => start,
            None => offset_date("get_analytics", end, self.config.default_window_days.saturating_neg())?,
        };
        if start > end {
            return Err(RevenueError::invalid(
                "get_analytics",
                format!("start_date {start} is after end_date {end}"),
            ));
        }

        let metrics = self.store.metrics_between(start, end).await?;
        let average_ticket_price = self
            .store
            .average_ticket_price(start, end)
            .await?
            .unwrap_or(Decimal::ZERO);

        let analytics = summarize(&metrics, start, end, average_ticket_price);
        debug!(
            %start,
            %end,
            days = metrics.len(),
            growth_rate = analytics.growth_rate,
            trend = ?analytics.trend,
            "analytics computed"
        );
        Ok(analytics)
    }
}

fn summarize(metrics: &[RevenueMetric], start: NaiveDate, end: NaiveDate, average_ticket_price: Decimal) -> Analytics {
    let total_revenue: Decimal = metrics.iter().map(|m| m.actual_revenue).sum();
    let average_daily_revenue = if metrics.is_empty() {
        Decimal::ZERO
    } else {
        (total_revenue / Decimal::from(metrics.len())).round_dp(2)
    };

    let growth_rate = growth_rate(metrics);

    Analytics {
        start_date: start,
        end_date: end,
        total_revenue,
        average_daily_revenue,
        total_bookings: metrics.iter().map(|m| m.booking_count).sum(),
        total_passengers: metrics.iter().map(|m| m.passenger_count).sum(),
        average_ticket_price,
        growth_rate,
        trend: Trend::classify(growth_rate),
        best_day: extreme_day(metrics, |candidate, best| candidate > best),
        worst_day: extreme_day(metrics, |candidate, worst| candidate < worst),
    }
}

/// Zero for fewer than two points or a zero first half.
fn growth_rate(metrics: &[RevenueMetric]) -> f64 {
    if metrics.len() < 2 {
        return 0.0;
    }
    let mid = metrics.len() / 2;
    let first_avg = average(&metrics[..mid]);
    let second_avg = average(&metrics[mid..]);
    if first_avg.is_zero() {
        return 0.0;
    }
    ((second_avg - first_avg) / first_avg * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0)
}

fn average(metrics: &[RevenueMetric]) -> Decimal {
    let total: Decimal = metrics.iter().map(|m| m.actual_revenue).sum();
    total / Decimal::from(metrics.len())
}

/// The earliest date wins a tie, since only a strictly better value replaces it.
fn extreme_day(metrics: &[RevenueMetric], better: impl Fn(Decimal, Decimal) -> bool) -> Option<NaiveDate> {
    metrics
        .iter()
        .fold(None::<&RevenueMetric>, |acc, m| match acc {
            Some(current) if !better(m.actual_revenue, current.actual_revenue) => Some(current),
            _ => Some(m),
        })
        .map(|m| m.date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::MetricValues;
    use crate::store::memory::MemoryStore;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn reporter_with(revenues: &[(&str, Decimal, u64)], today: &str) -> AnalyticsReporter<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for (d, revenue, passengers) in revenues {
            store
                .upsert_metric(MetricValues {
                    date: date(d),
                    actual_revenue: *revenue,
                    booking_count: 2,
                    passenger_count: *passengers,
                    flight_count: 1,
                    cancellation_count: 0,
                    average_ticket_price: crate::models::average_ticket_price(*revenue, *passengers),
                    refund_amount: Decimal::ZERO,
                    notes: None,
                })
                .await
                .unwrap();
        }
        AnalyticsReporter::new(store, Arc::new(FixedClock::on(date(today))), AnalyticsConfig::default())
    }

    #[tokio::test]
    async fn two_days_doubling_is_increasing() {
        let reporter = reporter_with(
            &[("2024-01-01", dec!(1000), 4), ("2024-01-02", dec!(2000), 4)],
            "2024-01-10",
        )
        .await;

        let a = reporter
            .get_analytics(Some(date("2024-01-01")), Some(date("2024-01-02")))
            .await
            .unwrap();

        assert_eq!(a.growth_rate, 100.0);
        assert_eq!(a.trend, Trend::Increasing);
        assert_eq!(a.best_day, Some(date("2024-01-02")));
        assert_eq!(a.worst_day, Some(date("2024-01-01")));
        assert_eq!(a.total_revenue, dec!(3000));
        assert_eq!(a.average_daily_revenue, dec!(1500));
        assert_eq!(a.total_bookings, 4);
        assert_eq!(a.total_passengers, 8);
        assert_eq!(a.average_ticket_price, dec!(375));
    }

    #[tokio::test]
    async fn empty_window_is_stable_without_extremes() {
        let reporter = reporter_with(&[], "2024-01-10").await;

        let a = reporter.get_analytics(None, None).await.unwrap();

        assert_eq!(a.growth_rate, 0.0);
        assert_eq!(a.trend, Trend::Stable);
        assert_eq!(a.best_day, None);
        assert_eq!(a.worst_day, None);
        assert_eq!(a.total_revenue, Decimal::ZERO);
        assert_eq!(a.average_ticket_price, Decimal::ZERO);
    }

    #[tokio::test]
    async fn defaults_to_thirty_days_ending_today() {
        let reporter = reporter_with(
            &[("2024-01-09", dec!(500), 1), ("2024-03-01", dec!(900), 1), ("2024-03-10", dec!(700), 1)],
            "2024-03-10",
        )
        .await;

        let a = reporter.get_analytics(None, None).await.unwrap();

        assert_eq!(a.end_date, date("2024-03-10"));
        assert_eq!(a.start_date, date("2024-02-09"));
        assert_eq!(a.total_revenue, dec!(1600));
        // 900 -> 700 is a 22.2% drop.
        assert_eq!(a.trend, Trend::Decreasing);
    }

    #[tokio::test]
    async fn single_point_is_stable() {
        let reporter = reporter_with(&[("2024-01-05", dec!(1200), 3)], "2024-01-10").await;
        let a = reporter.get_analytics(None, None).await.unwrap();
        assert_eq!(a.growth_rate, 0.0);
        assert_eq!(a.trend, Trend::Stable);
        assert_eq!(a.best_day, Some(date("2024-01-05")));
        assert_eq!(a.worst_day, Some(date("2024-01-05")));
    }

    #[tokio::test]
    async fn zero_first_half_does_not_divide() {
        let reporter = reporter_with(
            &[("2024-01-01", Decimal::ZERO, 0), ("2024-01-02", dec!(400), 2)],
            "2024-01-10",
        )
        .await;
        let a = reporter
            .get_analytics(Some(date("2024-01-01")), Some(date("2024-01-02")))
            .await
            .unwrap();
        assert_eq!(a.growth_rate, 0.0);
        assert_eq!(a.trend, Trend::Stable);
        assert_eq!(a.average_ticket_price, dec!(200));
    }

    #[tokio::test]
    async fn ties_pick_the_earliest_day() {
        let reporter = reporter_with(
            &[("2024-01-01", dec!(100), 1), ("2024-01-02", dec!(300), 1), ("2024-01-03", dec!(300), 1), ("2024-01-04", dec!(100), 1)],
            "2024-01-10",
        )
        .await;
        let a = reporter
            .get_analytics(Some(date("2024-01-01")), Some(date("2024-01-04")))
            .await
            .unwrap();
        assert_eq!(a.best_day, Some(date("2024-01-02")));
        assert_eq!(a.worst_day, Some(date("2024-01-01")));
    }

    #[tokio::test]
    async fn inverted_window_is_rejected() {
        let reporter = reporter_with(&[], "2024-01-10").await;
        let err = reporter
            .get_analytics(Some(date("2024-01-05")), Some(date("2024-01-01")))
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn default_window_before_first_calendar_day_is_rejected() {
        let reporter = reporter_with(&[], "2024-01-10").await;
        let err = reporter.get_analytics(None, Some(NaiveDate::MIN)).await.unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("get_analytics"));
    }

    #[test]
    fn trend_thresholds_are_exclusive() {
        assert_eq!(Trend::classify(5.0), Trend::Stable);
        assert_eq!(Trend::classify(5.01), Trend::Increasing);
        assert_eq!(Trend::classify(-5.0), Trend::Stable);
        assert_eq!(Trend::classify(-5.01), Trend::Decreasing);
    }
}
