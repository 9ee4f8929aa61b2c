//! Axum route handlers for the LinkedIn bridge.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::normalize_email;
use crate::errors::AppError;
use crate::linkedin::enrichment::normalize_profile_url;
use crate::linkedin::oauth::userinfo_email;
use crate::linkedin::state_store::{consume_state, issue_state};
use crate::state::AppState;
use crate::store::users::{find_user, upsert_linked_in, upsert_oauth_profile};

#[derive(Debug, Deserialize)]
pub struct LinkedInLoginRequest {
    pub email: String,
    pub linked_in_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /linkedin/redirecturl
pub async fn handle_redirect_url(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let nonce = issue_state(&state.redis).await?;
    let url = state.linkedin.authorization_url(&nonce)?;
    Ok(Redirect::temporary(url.as_str()))
}

/// GET /linkedin/callback
///
/// Exchanges the authorization code, stores the `userinfo` snapshot under the
/// member's email, and hands the browser back to the frontend.
pub async fn handle_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError> {
    if let Some(error) = query.error.as_deref() {
        warn!(
            "LinkedIn authorization denied: {error} {}",
            query.error_description.as_deref().unwrap_or_default()
        );
        return Err(AppError::Validation(format!(
            "LinkedIn authorization failed: {error}"
        )));
    }

    let code = query
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("Authorization code not found".to_string()))?;

    let nonce = query.state.as_deref().unwrap_or_default();
    if !consume_state(&state.redis, nonce).await? {
        return Err(AppError::Validation(
            "Invalid or expired OAuth state".to_string(),
        ));
    }

    let access_token = state.linkedin.exchange_code(code).await?;
    let profile = state.linkedin.fetch_userinfo(&access_token).await?;

    let email = userinfo_email(&profile)
        .ok_or_else(|| AppError::Upstream("LinkedIn profile has no email".to_string()))
        .and_then(normalize_email)?;

    upsert_oauth_profile(&state.db, &email, &profile).await?;
    info!("LinkedIn OAuth completed for {email}");

    let target = frontend_redirect(&state.config.frontend_url, &email)?;
    Ok(Redirect::temporary(&target))
}

/// GET /linkedin/profile/:email
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Value>, AppError> {
    let email = normalize_email(&email)?;
    let user = find_user(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    user.linked_in_data
        .filter(|d| !d.is_null())
        .map(Json)
        .ok_or_else(|| AppError::NotFound("LinkedIn data not found".to_string()))
}

/// POST /linkedin/linkedin_login (also mounted at /auth/linkedin_login)
///
/// Attaches a LinkedIn URL to the user and stores whatever enrichment
/// snapshot can be fetched for it. A failed fetch stores `null`.
pub async fn handle_linkedin_login(
    State(state): State<AppState>,
    Json(request): Json<LinkedInLoginRequest>,
) -> Result<Json<Value>, AppError> {
    let email = normalize_email(&request.email)?;
    let url = normalize_profile_url(Some(&request.linked_in_url))
        .ok_or_else(|| AppError::Validation("linked_in_url cannot be empty".to_string()))?;

    let data = state.enricher.fetch_profile(&url).await;
    upsert_linked_in(&state.db, &email, &url, data.as_ref()).await?;

    Ok(Json(json!({ "message": "successfully data stored" })))
}

/// `{frontend_url}/upload-details/{email}` with the email as one encoded path segment.
fn frontend_redirect(frontend_url: &str, email: &str) -> Result<String, AppError> {
    let mut url = Url::parse(frontend_url)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid FRONTEND_URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("FRONTEND_URL cannot be a base")))?
        .pop_if_empty()
        .push("upload-details")
        .push(email);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontend_redirect_appends_email_segment() {
        assert_eq!(
            frontend_redirect("https://app.example.com", "ada@example.com").unwrap(),
            "https://app.example.com/upload-details/ada@example.com"
        );
        assert_eq!(
            frontend_redirect("https://app.example.com/portal/", "ada@example.com").unwrap(),
            "https://app.example.com/portal/upload-details/ada@example.com"
        );
    }

    #[test]
    fn test_frontend_redirect_encodes_reserved_characters() {
        let target = frontend_redirect("https://app.example.com", "a/b?c@example.com").unwrap();
        assert_eq!(
            target,
            "https://app.example.com/upload-details/a%2Fb%3Fc@example.com"
        );
    }

    #[test]
    fn test_frontend_redirect_rejects_invalid_base() {
        assert!(frontend_redirect("not a url", "ada@example.com").is_err());
    }
}
