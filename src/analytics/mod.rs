pub mod reporter;

pub use reporter::{Analytics, AnalyticsReporter, Trend};
