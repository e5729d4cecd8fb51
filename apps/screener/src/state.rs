use std::sync::Arc;

use crate::config::Config;
use crate::parsing::ResumeParser;
use crate::scoring::ScoringEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub parser: Arc<ResumeParser>,
    /// Holds the embedding provider; read-only after startup.
    pub engine: Arc<ScoringEngine>,
    pub config: Config,
}
