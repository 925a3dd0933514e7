//! Ledger backed by the platform's PostgreSQL tables.

use chrono::NaiveDate;
use sqlx::PgPool;

use super::{DailyActivity, Ledger};
use crate::db::queries;
use crate::error::Result;

pub struct PgLedger {
    db: PgPool,
}

impl PgLedger {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

impl Ledger for PgLedger {
    async fn daily_activity(&self, date: NaiveDate) -> Result<DailyActivity> {
        let confirmed_bookings = queries::count_bookings_by_status(&self.db, date, "confirmed").await?;
        let cancelled_bookings = queries::count_bookings_by_status(&self.db, date, "cancelled").await?;
        let successful_payments = queries::sum_successful_payments(&self.db, date).await?;
        let passengers = queries::count_confirmed_passengers(&self.db, date).await?;
        let departing_flights = queries::count_departing_flights(&self.db, date).await?;
        let refunds_requested = queries::sum_refunds_requested(&self.db, date).await?;

        Ok(DailyActivity {
            confirmed_bookings,
            successful_payments,
            passengers,
            departing_flights,
            cancelled_bookings,
            refunds_requested,
        })
    }
}
