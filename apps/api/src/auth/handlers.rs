//! Axum route handlers for the Identity API.

use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::extractor::AuthUser;
use crate::auth::jwt::{bearer_token, issue_token, verify_token, Claims};
use crate::auth::normalize_email;
use crate::auth::password::{hash_password, verify_password};
use crate::errors::AppError;
use crate::linkedin::enrichment::normalize_profile_url;
use crate::models::user::UserProfile;
use crate::state::AppState;
use crate::store::users::{find_user, register_user, NewUser};

const MIN_PASSWORD_LEN: usize = 8;
/// bcrypt ignores input beyond 72 bytes.
const MAX_PASSWORD_BYTES: usize = 72;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub linked_in_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyTokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyTokenResponse {
    pub message: String,
    pub user: Claims,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<Value>, AppError> {
    let email = normalize_email(&request.email)?;
    validate_password(&request.password)?;

    if find_user(&state.db, &email)
        .await?
        .is_some_and(|u| u.password_hash.is_some())
    {
        return Err(AppError::Validation("Email already registered".to_string()));
    }

    // Enrichment failures never block signup.
    let linked_in_url = normalize_profile_url(request.linked_in_url.as_deref());
    let linked_in_data = match &linked_in_url {
        Some(url) => state.enricher.fetch_profile(url).await,
        None => None,
    };

    let password_hash = hash_password(request.password).await?;
    let created = register_user(
        &state.db,
        NewUser {
            email: &email,
            password_hash: &password_hash,
            linked_in_url: linked_in_url.as_deref(),
            linked_in_data: linked_in_data.as_ref(),
        },
    )
    .await?;

    // Lost a race against a concurrent signup for the same email.
    if !created {
        return Err(AppError::Validation("Email already registered".to_string()));
    }

    Ok(Json(json!({ "message": "User registered successfully" })))
}

/// POST /auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let email = normalize_email(&request.email).map_err(|_| invalid())?;
    let stored_hash = find_user(&state.db, &email)
        .await?
        .and_then(|u| u.password_hash)
        .ok_or_else(invalid)?;

    if !verify_password(request.password, stored_hash).await? {
        warn!("Failed login for {email}");
        return Err(invalid());
    }

    let token = issue_token(&email, &state.config.jwt_secret, state.config.jwt_ttl_secs)?;
    info!("Issued token for {email}");
    Ok(Json(TokenResponse { token }))
}

/// GET /auth/verify-token?token=..
///
/// Also accepts the token as `Authorization: Bearer <token>`.
pub async fn handle_verify_token(
    State(state): State<AppState>,
    Query(query): Query<VerifyTokenQuery>,
    headers: HeaderMap,
) -> Result<Json<VerifyTokenResponse>, AppError> {
    let header_token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);

    let token = query
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or(header_token)
        .ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;

    let claims = verify_token(token, &state.config.jwt_secret)?;
    Ok(Json(VerifyTokenResponse {
        message: "Token is valid".to_string(),
        user: claims,
    }))
}

/// GET /auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    find_user(&state.db, user.email())
        .await?
        .map(|row| Json(UserProfile::from(row)))
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.trim().is_empty() {
        return Err(AppError::Validation("password cannot be empty".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Validation(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}
