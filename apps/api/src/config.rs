use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub openai_api_key: String,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub linkedin_client_id: String,
    pub linkedin_client_secret: String,
    pub linkedin_redirect_uri: String,
    /// Base URL of the web frontend the OAuth callback hands the user back to.
    pub frontend_url: String,
    /// Proxycurl key for profile enrichment. Enrichment is disabled when unset.
    pub proxycurl_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            jwt_secret: require_env("JWT_SECRET_KEY")?,
            jwt_ttl_secs: std::env::var("JWT_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse::<i64>()
                .context("JWT_TTL_SECS must be a whole number of seconds")?,
            linkedin_client_id: require_env("LINKEDIN_CLIENT_ID")?,
            linkedin_client_secret: require_env("LINKEDIN_CLIENT_SECRET")?,
            linkedin_redirect_uri: require_env("LINKEDIN_REDIRECT_URI")?,
            frontend_url: require_env("FRONTEND_URL")?
                .trim_end_matches('/')
                .to_string(),
            proxycurl_api_key: std::env::var("PROXYCURL_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
