use std::sync::Arc;

use crate::advisor::Advisor;
use crate::config::Config;
use crate::media::MediaStorage;
use crate::store::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Document store. Postgres in production, in-memory for local runs and tests.
    pub store: Arc<dyn DocumentStore>,
    /// Generative-AI assistance (submission assessment, course suggestions).
    pub advisor: Arc<dyn Advisor>,
    pub media: Arc<dyn MediaStorage>,
    pub config: Config,
}
