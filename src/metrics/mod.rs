pub mod aggregator;
pub mod scheduler;

pub use aggregator::{offset_date, parse_date, MetricInput, MetricsAggregator};
