use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::linkedin::enrichment::ProfileEnricher;
use crate::linkedin::oauth::LinkedInOAuth;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Short-lived OAuth `state` nonces.
    pub redis: RedisClient,
    pub llm: LlmClient,
    pub linkedin: LinkedInOAuth,
    /// Pluggable profile enrichment. Proxycurl when a key is configured, disabled otherwise.
    pub enricher: Arc<dyn ProfileEnricher>,
    pub config: Config,
}
