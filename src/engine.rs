//! Wires the aggregator, orchestrator and reporter over one ledger and store.

use std::sync::Arc;

use crate::analytics::AnalyticsReporter;
use crate::clock::Clock;
use crate::config::Config;
use crate::ledger::Ledger;
use crate::metrics::MetricsAggregator;
use crate::prediction::PredictionOrchestrator;
use crate::store::RevenueStore;

pub struct RevenueEngine<L, S> {
    pub metrics: Arc<MetricsAggregator<L, S>>,
    pub predictions: PredictionOrchestrator<S>,
    pub analytics: AnalyticsReporter<S>,
    pub clock: Arc<dyn Clock>,
}

impl<L: Ledger, S: RevenueStore> RevenueEngine<L, S> {
    pub fn new(ledger: Arc<L>, store: Arc<S>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self {
            metrics: Arc::new(MetricsAggregator::new(ledger, store.clone())),
            predictions: PredictionOrchestrator::new(store.clone(), clock.clone(), config.forecast.clone()),
            analytics: AnalyticsReporter::new(store, clock.clone(), config.analytics.clone()),
            clock,
        }
    }
}
