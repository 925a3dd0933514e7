//! Moving average — the mean of the trailing window, held flat.

use rust_decimal::prelude::*;
use serde_json::json;

use super::stats::{mean, std_dev};
use super::{revenues, Fallback, ForecastContext, ModelKind};
use crate::models::{NewRevenueForecast, RevenueMetric};

/// Confidence never drops below this when there is any history.
const CONFIDENCE_FLOOR: f64 = 50.0;

pub fn predict(history: &[RevenueMetric], horizon_days: u32, ctx: &ForecastContext) -> Vec<NewRevenueForecast> {
    predict_with(history, horizon_days, ctx, None)
}

pub(crate) fn predict_with(
    history: &[RevenueMetric],
    horizon_days: u32,
    ctx: &ForecastContext,
    fallback: Option<Fallback>,
) -> Vec<NewRevenueForecast> {
    if history.is_empty() {
        return default_prediction(horizon_days, ctx, fallback);
    }

    let values = revenues(history);
    let window = ctx.settings.window.min(values.len());
    let recent = &values[values.len() - window..];

    let avg = mean(recent);
    let sd = std_dev(recent);
    let confidence = confidence(avg, sd);

    let mut features = json!({
        "window": window,
        "sample_count": values.len(),
        "mean": avg,
        "stddev": sd,
    });
    let notes = fallback.map(|fb| {
        features["requested_model"] = json!(fb.requested.as_str());
        features["fallback_reason"] = json!(fb.reason);
        format!("{}; used moving_average", fb.reason)
    });

    (1..=horizon_days)
        .map(|day| {
            ctx.build(
                day,
                avg,
                confidence,
                ModelKind::MovingAverage,
                &features,
                notes.as_deref(),
            )
        })
        .collect()
}

/// Coefficient-of-variation confidence. A zero mean has no defined variation
/// and sits on the floor.
fn confidence(avg: f64, sd: f64) -> f64 {
    if avg <= 0.0 {
        return CONFIDENCE_FLOOR;
    }
    (100.0 - sd / avg * 100.0).max(CONFIDENCE_FLOOR).min(100.0)
}

/// No history at all: a flat configured default with low confidence.
fn default_prediction(
    horizon_days: u32,
    ctx: &ForecastContext,
    fallback: Option<Fallback>,
) -> Vec<NewRevenueForecast> {
    let value = ctx.settings.default_daily_revenue.to_f64().unwrap_or(0.0);
    let mut features = json!({
        "window": ctx.settings.window,
        "sample_count": 0,
        "default_daily_revenue": value,
    });
    if let Some(fb) = &fallback {
        features["requested_model"] = json!(fb.requested.as_str());
        features["fallback_reason"] = json!(fb.reason);
    }
    let notes = "insufficient data: no historical metrics, using default daily revenue";

    (1..=horizon_days)
        .map(|day| {
            ctx.build(
                day,
                value,
                ctx.settings.insufficient_data_confidence,
                ModelKind::MovingAverage,
                &features,
                Some(notes),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn single_point_is_repeated() {
        let hist = history(&[1234.5]);
        let out = predict(&hist, 5, &ctx(day(0)));
        assert_contiguous(&out, day(0), 5);
        assert!(out.iter().all(|f| f.predicted_revenue == dec!(1234.5)));
        // No variance: full confidence.
        assert!(out.iter().all(|f| f.confidence_score == 100.0));
    }

    #[test]
    fn uses_only_trailing_window() {
        let mut revenues = vec![100_000.0; 10];
        revenues.extend([1000.0, 2000.0, 3000.0, 1000.0, 2000.0, 3000.0, 2000.0]);
        let out = predict(&history(&revenues), 3, &ctx(day(16)));
        assert!(out.iter().all(|f| f.predicted_revenue == dec!(2000)));
        assert_eq!(out[0].features_used["window"], 7);
        assert_eq!(out[0].features_used["sample_count"], 17);
    }

    #[test]
    fn high_variance_is_floored_at_fifty() {
        let out = predict(&history(&[0.0, 10_000.0, 0.0, 10_000.0]), 1, &ctx(day(3)));
        assert_eq!(out[0].confidence_score, 50.0);
    }

    #[test]
    fn empty_history_uses_default() {
        let out = predict(&[], 4, &ctx(day(0)));
        assert_contiguous(&out, day(0), 4);
        for f in &out {
            assert_eq!(f.predicted_revenue, dec!(5000));
            assert_eq!(f.confidence_score, 30.0);
            assert!(f.notes.as_deref().unwrap().contains("insufficient data"));
        }
    }

    #[test]
    fn all_zero_history_stays_at_zero() {
        let out = predict(&history(&[0.0; 7]), 2, &ctx(day(6)));
        assert!(out.iter().all(|f| f.predicted_revenue.is_zero()));
        assert!(out.iter().all(|f| f.confidence_score == 50.0));
    }
}
