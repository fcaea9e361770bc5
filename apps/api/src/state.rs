use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::resume::service::UpdateService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    pub config: Config,
    /// Smart update orchestrator. Shared so its per-resume locks are process-wide.
    pub updates: Arc<UpdateService>,
}
