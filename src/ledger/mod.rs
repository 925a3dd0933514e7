//! Read-only access to the booking platform's ledgers.
//!
//! The aggregator only needs one summary per date, so the seam is a single
//! query rather than one method per table.

pub mod memory;
pub mod postgres;

use std::future::Future;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::Result;

/// Everything that happened on one calendar date, as seen by the ledgers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyActivity {
    /// Bookings made on the date that are confirmed.
    pub confirmed_bookings: u64,
    /// Sum of successful payments made on the date.
    pub successful_payments: Decimal,
    /// Passengers on confirmed bookings made on the date.
    pub passengers: u64,
    /// Flights departing on the date.
    pub departing_flights: u64,
    /// Bookings made on the date that ended up cancelled.
    pub cancelled_bookings: u64,
    /// Refund amounts requested on the date.
    pub refunds_requested: Decimal,
}

pub trait Ledger: Send + Sync + 'static {
    fn daily_activity(&self, date: NaiveDate) -> impl Future<Output = Result<DailyActivity>> + Send;
}
