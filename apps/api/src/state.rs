use crate::config::Config;
use crate::tailoring::pipeline::TailoringPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the validator, upload store, fetcher, and the `Arc<dyn TextGenerator>` backend.
    pub pipeline: TailoringPipeline,
}
