//! Revenue forecasting and analytics for the travel booking platform.
//!
//! Daily metrics are aggregated from the booking ledgers, fed to one of three
//! forecast models, and summarised into trend reports. Storage and ledger
//! access sit behind the [`store::RevenueStore`] and [`ledger::Ledger`] traits,
//! with PostgreSQL and in-memory implementations of each.

pub mod analytics;
pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod ledger;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod prediction;
pub mod store;
pub mod web;

pub use engine::RevenueEngine;
pub use error::{Result, RevenueError};
