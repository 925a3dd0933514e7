//! Daily collection loop.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::clock::Clock;
use crate::config::CollectorConfig;
use crate::ledger::Ledger;
use crate::store::RevenueStore;

use super::aggregator::{offset_date, MetricsAggregator};

/// Collect `today - lag_days` on every tick. Failures are logged and retried
/// on the next tick; the loop never exits on its own.
pub async fn run_collection_loop<L: Ledger, S: RevenueStore>(
    aggregator: Arc<MetricsAggregator<L, S>>,
    clock: Arc<dyn Clock>,
    config: CollectorConfig,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(config.interval_secs.max(1)));
    info!(interval_secs = config.interval_secs, lag_days = config.lag_days, "metrics collector started");

    loop {
        interval.tick().await;
        let target = match offset_date("scheduled_collection", clock.today(), config.lag_days.saturating_neg()) {
            Ok(target) => target,
            Err(e) => {
                error!(error = %e, "scheduled metrics collection skipped");
                continue;
            }
        };
        if let Err(e) = aggregator.collect_metrics(target).await {
            error!(error = %e, date = %target, "scheduled metrics collection failed");
        }
    }
}
