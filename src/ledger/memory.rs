//! In-memory ledger that scans raw platform records.
//!
//! Used by tests and by tooling that replays exported ledgers.

use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DailyActivity, Ledger};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Failed,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: i64,
    pub booking_date: NaiveDateTime,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: i64,
    pub booking_id: i64,
    pub amount: Decimal,
    pub payment_date: NaiveDateTime,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub passenger_id: i64,
    pub booking_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub flight_id: i64,
    pub departure_time: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub refund_id: i64,
    pub booking_id: i64,
    pub refund_amount: Decimal,
    pub requested_at: NaiveDateTime,
}

#[derive(Debug, Default)]
struct Records {
    bookings: Vec<Booking>,
    payments: Vec<Payment>,
    passengers: Vec<Passenger>,
    flights: Vec<Flight>,
    refunds: Vec<Refund>,
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: RwLock<Records>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_booking(&self, booking: Booking) {
        self.records.write().bookings.push(booking);
    }

    pub fn add_payment(&self, payment: Payment) {
        self.records.write().payments.push(payment);
    }

    pub fn add_passenger(&self, passenger: Passenger) {
        self.records.write().passengers.push(passenger);
    }

    pub fn add_flight(&self, flight: Flight) {
        self.records.write().flights.push(flight);
    }

    pub fn add_refund(&self, refund: Refund) {
        self.records.write().refunds.push(refund);
    }

    fn summarize(&self, date: NaiveDate) -> DailyActivity {
        let records = self.records.read();

        let booked_on = |b: &&Booking| b.booking_date.date() == date;
        let confirmed_ids: Vec<i64> = records
            .bookings
            .iter()
            .filter(booked_on)
            .filter(|b| b.status == BookingStatus::Confirmed)
            .map(|b| b.booking_id)
            .collect();

        let cancelled_bookings = records
            .bookings
            .iter()
            .filter(booked_on)
            .filter(|b| b.status == BookingStatus::Cancelled)
            .count() as u64;

        let successful_payments = records
            .payments
            .iter()
            .filter(|p| p.payment_date.date() == date && p.status == PaymentStatus::Success)
            .map(|p| p.amount)
            .sum();

        let passengers = records
            .passengers
            .iter()
            .filter(|p| confirmed_ids.contains(&p.booking_id))
            .count() as u64;

        let departing_flights = records
            .flights
            .iter()
            .filter(|f| f.departure_time.date() == date)
            .count() as u64;

        let refunds_requested = records
            .refunds
            .iter()
            .filter(|r| r.requested_at.date() == date)
            .map(|r| r.refund_amount)
            .sum();

        DailyActivity {
            confirmed_bookings: confirmed_ids.len() as u64,
            successful_payments,
            passengers,
            departing_flights,
            cancelled_bookings,
            refunds_requested,
        }
    }
}

impl Ledger for MemoryLedger {
    async fn daily_activity(&self, date: NaiveDate) -> Result<DailyActivity> {
        Ok(self.summarize(date))
    }
}
