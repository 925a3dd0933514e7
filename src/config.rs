//! Configuration — TOML file defaults + environment variable overrides.
//!
//! Model parameters live in `config/default.toml`.
//! The database URL comes from `DATABASE_URL` when set.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

use crate::error::Result;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    /// Trailing days averaged by the moving-average model.
    #[serde(default = "default_window")]
    pub moving_average_window: usize,
    /// Flat prediction used when there is no history at all.
    #[serde(default = "default_daily_revenue")]
    pub default_daily_revenue: Decimal,
    #[serde(default = "default_insufficient_confidence")]
    pub insufficient_data_confidence: f64,
    /// How many days before the horizon start are loaded as history.
    #[serde(default = "default_history_days")]
    pub history_days: i64,
    #[serde(default = "default_max_horizon")]
    pub max_horizon_days: i64,
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            moving_average_window: default_window(),
            default_daily_revenue: default_daily_revenue(),
            insufficient_data_confidence: default_insufficient_confidence(),
            history_days: default_history_days(),
            max_horizon_days: default_max_horizon(),
            model_version: default_model_version(),
        }
    }
}

fn default_window() -> usize {
    7
}
fn default_daily_revenue() -> Decimal {
    Decimal::new(500_000, 2)
}
fn default_insufficient_confidence() -> f64 {
    30.0
}
fn default_history_days() -> i64 {
    90
}
fn default_max_horizon() -> i64 {
    366
}
fn default_model_version() -> String {
    "1.0".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_analytics_window")]
    pub default_window_days: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_analytics_window(),
        }
    }
}

fn default_analytics_window() -> i64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Run the daily metrics collection loop inside the service.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_collect_interval")]
    pub interval_secs: u64,
    /// Collect for `today - lag_days` so the day's ledger is complete.
    #[serde(default = "default_lag_days")]
    pub lag_days: i64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_collect_interval(),
            lag_days: default_lag_days(),
        }
    }
}

fn default_collect_interval() -> u64 {
    86_400
}
fn default_lag_days() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_port(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_output: false,
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from `config/default.toml` merged with env vars
    /// prefixed with `RF__` (e.g. `RF__FORECAST__HISTORY_DAYS=120`).
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(env_source())
            .build()?;

        let mut cfg: Config = builder.try_deserialize()?;

        if let Ok(v) = env::var("DATABASE_URL") {
            cfg.database.url = v;
        }

        Ok(cfg)
    }
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix("RF")
        .separator("__")
        .try_parsing(true)
}
