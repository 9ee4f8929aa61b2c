mod assessment;
mod auth;
mod config;
mod db;
mod errors;
mod extraction;
mod linkedin;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use axum::http::HeaderValue;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::linkedin::enrichment::{DisabledEnricher, ProfileEnricher, ProxycurlEnricher};
use crate::linkedin::oauth::LinkedInOAuth;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Linkfetch API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (document store)
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize LLM client
    let llm = LlmClient::new(config.openai_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Outbound HTTP client shared by the LinkedIn and enrichment integrations
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let linkedin = LinkedInOAuth::new(
        http.clone(),
        config.linkedin_client_id.clone(),
        config.linkedin_client_secret.clone(),
        config.linkedin_redirect_uri.clone(),
    );

    let enricher: Arc<dyn ProfileEnricher> = match &config.proxycurl_api_key {
        Some(key) => {
            info!("Profile enrichment enabled (Proxycurl)");
            Arc::new(ProxycurlEnricher::new(http, key.clone()))
        }
        None => {
            warn!("PROXYCURL_API_KEY not set; profile enrichment disabled");
            Arc::new(DisabledEnricher)
        }
    };

    // Build app state
    let state = AppState {
        db,
        redis,
        llm,
        linkedin,
        enricher,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.frontend_url)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Allows browser calls from the frontend origin only.
fn cors_layer(frontend_url: &str) -> Result<CorsLayer> {
    let origin = reqwest::Url::parse(frontend_url)?.origin().ascii_serialization();
    Ok(CorsLayer::new()
        .allow_origin(HeaderValue::from_str(&origin)?)
        .allow_methods(Any)
        .allow_headers(Any))
}
