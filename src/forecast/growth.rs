//! Growth-based extrapolation: half-over-half growth, compounded weekly.

use serde_json::json;

use super::stats::mean;
use super::{moving_average, revenues, Fallback, ForecastContext, ModelKind};
use crate::models::{NewRevenueForecast, RevenueMetric};

pub const MIN_DATA_POINTS: usize = 14;

/// Used when the first half averaged zero and a ratio is undefined.
pub const DEFAULT_GROWTH_RATE: f64 = 0.05;

const CONFIDENCE_FLOOR: f64 = 40.0;
const CONFIDENCE_CEILING: f64 = 80.0;

pub fn predict(history: &[RevenueMetric], horizon_days: u32, ctx: &ForecastContext) -> Vec<NewRevenueForecast> {
    if history.len() < MIN_DATA_POINTS {
        let fallback = Fallback {
            requested: ModelKind::GrowthBased,
            reason: format!(
                "growth_based needs at least {MIN_DATA_POINTS} data points, got {}",
                history.len()
            ),
        };
        return moving_average::predict_with(history, horizon_days, ctx, Some(fallback));
    }

    let values = revenues(history);
    let mid = values.len() / 2;
    let first_half_avg = mean(&values[..mid]);
    let second_half_avg = mean(&values[mid..]);
    let growth_rate = growth_rate(first_half_avg, second_half_avg);

    let window = ctx.settings.window.min(values.len());
    let recent_avg = mean(&values[values.len() - window..]);

    let confidence = (CONFIDENCE_CEILING - (growth_rate * 1000.0).abs()).max(CONFIDENCE_FLOOR);
    let features = json!({
        "growth_rate": growth_rate,
        "first_half_avg": first_half_avg,
        "second_half_avg": second_half_avg,
        "recent_avg": recent_avg,
        "sample_count": values.len(),
    });

    (1..=horizon_days)
        .map(|day| {
            let weeks = f64::from(day) / 7.0;
            let value = (recent_avg * (1.0 + growth_rate).powf(weeks)).max(0.0);
            ctx.build(day, value, confidence, ModelKind::GrowthBased, &features, None)
        })
        .collect()
}

fn growth_rate(first_half_avg: f64, second_half_avg: f64) -> f64 {
    if first_half_avg <= 0.0 {
        return DEFAULT_GROWTH_RATE;
    }
    (second_half_avg - first_half_avg) / first_half_avg
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn flat_history_projects_flat() {
        let out = predict(&history(&[1000.0; 14]), 14, &ctx(day(13)));
        assert_contiguous(&out, day(13), 14);
        assert!(out.iter().all(|f| f.predicted_revenue == dec!(1000)));
        assert_eq!(out[0].confidence_score, 80.0);
        assert_eq!(out[0].model_used, "growth_based");
    }

    #[test]
    fn growth_compounds_weekly() {
        // First half averages 1000, second half 1100: 10% growth.
        let mut revenues = vec![1000.0; 7];
        revenues.extend([1100.0; 7]);
        let out = predict(&history(&revenues), 14, &ctx(day(13)));

        // Recent average is 1100; after one week 1210, after two 1331.
        assert_eq!(out[6].predicted_revenue, dec!(1210));
        assert_eq!(out[13].predicted_revenue, dec!(1331));
        assert!(out[0].predicted_revenue > dec!(1100));
        assert!(out[0].predicted_revenue < dec!(1210));
        // 80 - |0.1 * 1000| is below the floor.
        assert_eq!(out[0].confidence_score, 40.0);
    }

    #[test]
    fn zero_first_half_uses_default_rate() {
        let mut revenues = vec![0.0; 7];
        revenues.extend([700.0; 7]);
        let out = predict(&history(&revenues), 7, &ctx(day(13)));

        assert_eq!(out[0].features_used["growth_rate"], DEFAULT_GROWTH_RATE);
        let expected = Decimal::try_from(700.0 * 1.05).unwrap().round_dp(2);
        assert_eq!(out[6].predicted_revenue, expected);
        assert_eq!(out[0].confidence_score, 40.0);
    }

    #[test]
    fn short_history_falls_back_to_moving_average() {
        let out = predict(&history(&[500.0; 13]), 3, &ctx(day(12)));
        assert_eq!(out[0].model_used, "moving_average");
        assert_eq!(out[0].features_used["requested_model"], "growth_based");
        assert_eq!(out[0].predicted_revenue, dec!(500));
    }
}
