//! Linear regression over the day index.

use serde_json::json;

use super::stats::linear_fit;
use super::{moving_average, revenues, Fallback, ForecastContext, ModelKind};
use crate::models::{NewRevenueForecast, RevenueMetric};

pub const MIN_DATA_POINTS: usize = 7;

pub fn predict(history: &[RevenueMetric], horizon_days: u32, ctx: &ForecastContext) -> Vec<NewRevenueForecast> {
    let values = revenues(history);

    let fit = match linear_fit(&values) {
        Some(fit) if values.len() >= MIN_DATA_POINTS => fit,
        _ => {
            let fallback = Fallback {
                requested: ModelKind::LinearRegression,
                reason: format!(
                    "linear_regression needs at least {MIN_DATA_POINTS} data points, got {}",
                    values.len()
                ),
            };
            return moving_average::predict_with(history, horizon_days, ctx, Some(fallback));
        }
    };

    let confidence = fit.r_squared * 100.0;
    let features = json!({
        "r_squared": fit.r_squared,
        "slope": fit.slope,
        "intercept": fit.intercept,
        "sample_count": values.len(),
    });

    // The last observation sits at x = n - 1.
    let last_x = (values.len() - 1) as f64;
    (1..=horizon_days)
        .map(|day| {
            let value = fit.at(last_x + f64::from(day)).max(0.0);
            ctx.build(day, value, confidence, ModelKind::LinearRegression, &features, None)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn increasing_history_gives_increasing_predictions() {
        let revenues: Vec<f64> = (0..10).map(|i| 1000.0 + (i * i) as f64 * 15.0).collect();
        let out = predict(&history(&revenues), 7, &ctx(day(9)));

        assert_contiguous(&out, day(9), 7);
        for pair in out.windows(2) {
            assert!(pair[1].predicted_revenue > pair[0].predicted_revenue);
        }
        assert!(out[0].confidence_score > 0.0);
        assert_eq!(out[0].model_used, "linear_regression");
    }

    #[test]
    fn perfect_line_extrapolates_exactly() {
        let revenues: Vec<f64> = (0..7).map(|i| 100.0 + i as f64 * 50.0).collect();
        let out = predict(&history(&revenues), 2, &ctx(day(6)));
        assert_eq!(out[0].predicted_revenue, dec!(450));
        assert_eq!(out[1].predicted_revenue, dec!(500));
        assert!((out[0].confidence_score - 100.0).abs() < 1e-9);
        assert_eq!(out[0].features_used["sample_count"], 7);
    }

    #[test]
    fn steep_decline_is_floored_at_zero() {
        let revenues: Vec<f64> = (0..7).map(|i| 6000.0 - i as f64 * 1000.0).collect();
        let out = predict(&history(&revenues), 3, &ctx(day(6)));
        assert!(out.iter().all(|f| f.predicted_revenue.is_zero()));
    }

    #[test]
    fn short_history_falls_back_to_moving_average() {
        let out = predict(&history(&[100.0, 200.0, 300.0]), 2, &ctx(day(2)));
        assert_eq!(out[0].model_used, "moving_average");
        assert_eq!(out[0].predicted_revenue, dec!(200));
        assert_eq!(out[0].features_used["requested_model"], "linear_regression");
        assert!(out[0].notes.as_deref().unwrap().contains("at least 7"));
    }
}
