//! SQL query functions for the revenue tables and the platform ledgers.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::models::*;
use crate::error::{Result, RevenueError};
use crate::models::{MetricValues, NewRevenueForecast, RevenueForecast, RevenueMetric};

// ── Platform ledgers (read-only) ─────────────────────────────────

pub async fn count_bookings_by_status(
    pool: &PgPool,
    date: NaiveDate,
    status: &str,
) -> Result<u64> {
    let n = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM bookings WHERE booking_date::date = $1 AND status = $2"
    )
    .bind(date)
    .bind(status)
    .fetch_one(pool)
    .await?;
    Ok(n.max(0) as u64)
}

pub async fn sum_successful_payments(pool: &PgPool, date: NaiveDate) -> Result<Decimal> {
    let total = sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(amount), 0) FROM payments
         WHERE payment_date::date = $1 AND status = 'success'"
    )
    .bind(date)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

pub async fn count_confirmed_passengers(pool: &PgPool, date: NaiveDate) -> Result<u64> {
    let n = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(p.passenger_id) FROM passengers p
         JOIN bookings b ON b.booking_id = p.booking_id
         WHERE b.booking_date::date = $1 AND b.status = 'confirmed'"
    )
    .bind(date)
    .fetch_one(pool)
    .await?;
    Ok(n.max(0) as u64)
}

pub async fn count_departing_flights(pool: &PgPool, date: NaiveDate) -> Result<u64> {
    let n = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM flights WHERE departure_time::date = $1"
    )
    .bind(date)
    .fetch_one(pool)
    .await?;
    Ok(n.max(0) as u64)
}

pub async fn sum_refunds_requested(pool: &PgPool, date: NaiveDate) -> Result<Decimal> {
    let total = sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(refund_amount), 0) FROM refunds WHERE requested_at::date = $1"
    )
    .bind(date)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

// ── Revenue metrics ──────────────────────────────────────────────

/// Insert or replace the metric row for `values.date`. Existing notes survive
/// a re-collection that carries none.
pub async fn upsert_metric(pool: &PgPool, values: &MetricValues) -> Result<RevenueMetric> {
    let booking_count = db_count("booking_count", values.booking_count)?;
    let passenger_count = db_count("passenger_count", values.passenger_count)?;
    let flight_count = db_count("flight_count", values.flight_count)?;
    let cancellation_count = db_count("cancellation_count", values.cancellation_count)?;

    let row = sqlx::query_as::<_, DbRevenueMetric>(
        "INSERT INTO revenue_metrics (date, actual_revenue, booking_count, passenger_count,
         flight_count, cancellation_count, average_ticket_price, refund_amount, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         ON CONFLICT (date) DO UPDATE SET
            actual_revenue = EXCLUDED.actual_revenue,
            booking_count = EXCLUDED.booking_count,
            passenger_count = EXCLUDED.passenger_count,
            flight_count = EXCLUDED.flight_count,
            cancellation_count = EXCLUDED.cancellation_count,
            average_ticket_price = EXCLUDED.average_ticket_price,
            refund_amount = EXCLUDED.refund_amount,
            notes = COALESCE(EXCLUDED.notes, revenue_metrics.notes)
         RETURNING *"
    )
    .bind(values.date)
    .bind(values.actual_revenue)
    .bind(booking_count)
    .bind(passenger_count)
    .bind(flight_count)
    .bind(cancellation_count)
    .bind(values.average_ticket_price)
    .bind(values.refund_amount)
    .bind(values.notes.as_deref())
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}

pub async fn get_metrics_between(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<RevenueMetric>> {
    let rows = sqlx::query_as::<_, DbRevenueMetric>(
        "SELECT * FROM revenue_metrics WHERE date >= $1 AND date <= $2 ORDER BY date ASC"
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn get_all_metrics(pool: &PgPool) -> Result<Vec<RevenueMetric>> {
    let rows = sqlx::query_as::<_, DbRevenueMetric>(
        "SELECT * FROM revenue_metrics ORDER BY date ASC"
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn get_average_ticket_price(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Option<Decimal>> {
    let avg = sqlx::query_scalar::<_, Option<Decimal>>(
        "SELECT AVG(average_ticket_price) FROM revenue_metrics WHERE date >= $1 AND date <= $2"
    )
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;
    Ok(avg.map(|d| d.round_dp(2)))
}

// ── Revenue forecasts ────────────────────────────────────────────

/// Insert a whole forecast run in one transaction.
pub async fn insert_forecasts(
    pool: &PgPool,
    batch: &[NewRevenueForecast],
) -> Result<Vec<RevenueForecast>> {
    let mut tx = pool.begin().await?;
    let mut stored = Vec::with_capacity(batch.len());

    for f in batch {
        let row = sqlx::query_as::<_, DbRevenueForecast>(
            "INSERT INTO revenue_forecasts (forecast_date, predicted_revenue, actual_revenue,
             confidence_score, model_used, model_version, prediction_type, features_used,
             notes, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *"
        )
        .bind(f.forecast_date)
        .bind(f.predicted_revenue)
        .bind(f.actual_revenue)
        .bind(f.confidence_score)
        .bind(&f.model_used)
        .bind(&f.model_version)
        .bind(f.prediction_type.as_str())
        .bind(&f.features_used)
        .bind(f.notes.as_deref())
        .bind(f.created_at)
        .fetch_one(&mut *tx)
        .await?;
        stored.push(RevenueForecast::try_from(row)?);
    }

    tx.commit().await?;
    Ok(stored)
}

pub async fn get_forecasts_between(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<RevenueForecast>> {
    let rows = sqlx::query_as::<_, DbRevenueForecast>(
        "SELECT * FROM revenue_forecasts WHERE forecast_date >= $1 AND forecast_date <= $2
         ORDER BY forecast_date ASC, forecast_id ASC"
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(RevenueForecast::try_from).collect()
}

pub async fn get_all_forecasts(pool: &PgPool) -> Result<Vec<RevenueForecast>> {
    let rows = sqlx::query_as::<_, DbRevenueForecast>(
        "SELECT * FROM revenue_forecasts ORDER BY forecast_date ASC, forecast_id ASC"
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(RevenueForecast::try_from).collect()
}

pub async fn get_latest_forecasts(pool: &PgPool, limit: i64) -> Result<Vec<RevenueForecast>> {
    let rows = sqlx::query_as::<_, DbRevenueForecast>(
        "SELECT * FROM revenue_forecasts ORDER BY created_at DESC, forecast_id DESC LIMIT $1"
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(RevenueForecast::try_from).collect()
}

pub async fn set_forecast_actual(
    pool: &PgPool,
    forecast_id: i64,
    actual_revenue: Decimal,
) -> Result<Option<RevenueForecast>> {
    let row = sqlx::query_as::<_, DbRevenueForecast>(
        "UPDATE revenue_forecasts SET actual_revenue = $1 WHERE forecast_id = $2 RETURNING *"
    )
    .bind(actual_revenue)
    .bind(forecast_id)
    .fetch_optional(pool)
    .await?;
    row.map(RevenueForecast::try_from).transpose()
}

/// Counts are stored as BIGINT.
fn db_count(field: &str, value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| RevenueError::invalid("upsert_metric", format!("{field} {value} exceeds BIGINT range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_beyond_bigint_are_rejected() {
        assert_eq!(db_count("booking_count", 42).unwrap(), 42);
        assert_eq!(db_count("booking_count", i64::MAX as u64).unwrap(), i64::MAX);

        let err = db_count("passenger_count", u64::MAX).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("passenger_count"));
    }
}
