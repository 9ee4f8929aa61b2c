//! Profile enrichment: pluggable lookup of a public LinkedIn profile by URL.
//!
//! Default: `ProxycurlEnricher` when `PROXYCURL_API_KEY` is configured,
//! otherwise `DisabledEnricher`. `AppState` holds an `Arc<dyn ProfileEnricher>`.
//! Enrichment is best-effort: failures are logged and reported as `None`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{error, info, warn};

const PROXYCURL_PROFILE_URL: &str = "https://nubela.co/proxycurl/api/v2/linkedin";

#[async_trait]
pub trait ProfileEnricher: Send + Sync {
    /// Returns the raw profile snapshot for `linked_in_url`, or `None` when
    /// nothing could be fetched.
    async fn fetch_profile(&self, linked_in_url: &str) -> Option<Value>;
}

pub struct ProxycurlEnricher {
    client: Client,
    api_key: String,
}

impl ProxycurlEnricher {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl ProfileEnricher for ProxycurlEnricher {
    async fn fetch_profile(&self, linked_in_url: &str) -> Option<Value> {
        let response = self
            .client
            .get(PROXYCURL_PROFILE_URL)
            .bearer_auth(&self.api_key)
            .query(&[("url", linked_in_url)])
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                error!("Error fetching LinkedIn data for {linked_in_url}: {e}");
                return None;
            }
        };

        match response.json::<Value>().await {
            Ok(data) if !data.is_null() => {
                info!("Successfully fetched LinkedIn data for {linked_in_url}");
                Some(data)
            }
            Ok(_) => {
                warn!("No LinkedIn data found for {linked_in_url}");
                None
            }
            Err(e) => {
                error!("Unreadable LinkedIn data for {linked_in_url}: {e}");
                None
            }
        }
    }
}

/// Used when no enrichment provider is configured.
pub struct DisabledEnricher;

#[async_trait]
impl ProfileEnricher for DisabledEnricher {
    async fn fetch_profile(&self, linked_in_url: &str) -> Option<Value> {
        warn!("Profile enrichment disabled; skipping {linked_in_url}");
        None
    }
}

/// Trims the URL and drops it when blank.
pub fn normalize_profile_url(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|u| !u.is_empty())
        .map(String::from)
}
