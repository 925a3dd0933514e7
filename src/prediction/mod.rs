pub mod orchestrator;

pub use orchestrator::{ForecastInput, ModelInfo, PredictionOrchestrator, PredictionResult, PredictionSummary};
