use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::auth::jwt::{bearer_token, verify_token, Claims};
use crate::errors::AppError;
use crate::state::AppState;

/// A caller authenticated by an `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
}

impl AuthUser {
    pub fn email(&self) -> &str {
        &self.claims.email
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;

        let token = bearer_token(header).ok_or_else(|| {
            tracing::warn!("Invalid Authorization header format");
            AppError::Unauthorized("Invalid token".to_string())
        })?;

        let claims = verify_token(token, &state.config.jwt_secret)?;
        Ok(AuthUser { claims })
    }
}
