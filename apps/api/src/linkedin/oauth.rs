//! LinkedIn OAuth 2.0 (OpenID Connect) client: authorization URL, code
//! exchange, and `userinfo` retrieval.

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::AppError;

const AUTHORIZATION_URL: &str = "https://www.linkedin.com/oauth/v2/authorization";
const TOKEN_URL: &str = "https://www.linkedin.com/oauth/v2/accessToken";
const USERINFO_URL: &str = "https://api.linkedin.com/v2/userinfo";
const SCOPES: &str = "openid profile email";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Clone)]
pub struct LinkedInOAuth {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl LinkedInOAuth {
    pub fn new(
        client: Client,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            client,
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    /// Builds the provider authorization URL carrying `state`.
    pub fn authorization_url(&self, state: &str) -> Result<Url, AppError> {
        Url::parse_with_params(
            AUTHORIZATION_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", SCOPES),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid authorization URL: {e}")))
    }

    /// Exchanges an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("LinkedIn token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("LinkedIn token response unreadable: {e}")))?;

        let token = access_token_from(status, &body)?;
        debug!("LinkedIn access token obtained");
        Ok(token)
    }

    /// Fetches the OpenID `userinfo` document for the token's member.
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<Value, AppError> {
        let response = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("LinkedIn userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "LinkedIn userinfo returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("LinkedIn userinfo unreadable: {e}")))
    }
}

/// Reads the access token from a token endpoint reply. Any non-success status,
/// unreadable body, or reply without a token is a failed exchange.
fn access_token_from(status: StatusCode, body: &str) -> Result<String, AppError> {
    let failed = || AppError::Validation("Failed to retrieve access token".to_string());

    if !status.is_success() {
        warn!("LinkedIn token exchange failed ({status}): {body}");
        return Err(failed());
    }

    let reply: TokenResponse = serde_json::from_str(body).map_err(|e| {
        warn!("LinkedIn token response unreadable: {e}");
        failed()
    })?;

    reply.access_token.filter(|t| !t.is_empty()).ok_or_else(|| {
        warn!(
            "LinkedIn token exchange returned no token: {} {}",
            reply.error.unwrap_or_default(),
            reply.error_description.unwrap_or_default()
        );
        failed()
    })
}

/// The member email from a `userinfo` document.
pub fn userinfo_email(profile: &Value) -> Option<&str> {
    profile
        .get("email")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|e| !e.is_empty())
}
