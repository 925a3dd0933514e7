//! Unified error types for the revenue forecaster.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RevenueError {
    /// Caller supplied something the operation cannot accept. Never silently corrected.
    #[error("invalid input for {operation}: {message}")]
    InvalidInput {
        operation: &'static str,
        message: String,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RevenueError {
    pub fn invalid(operation: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            operation,
            message: message.into(),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, RevenueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_names_operation() {
        let err = RevenueError::invalid("generate_predictions", "unknown model 'arima'");
        assert!(err.is_invalid_input());
        assert_eq!(
            err.to_string(),
            "invalid input for generate_predictions: unknown model 'arima'"
        );
    }
}
