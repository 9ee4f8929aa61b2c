pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::assessment::handlers as assessment;
use crate::auth::handlers as auth;
use crate::extraction::handlers as extraction;
use crate::linkedin::handlers as linkedin;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Identity
        .route("/auth/signup", post(auth::handle_signup))
        .route("/auth/login", post(auth::handle_login))
        .route("/auth/verify-token", get(auth::handle_verify_token))
        .route("/auth/me", get(auth::handle_me))
        .route("/auth/linkedin_login", post(linkedin::handle_linkedin_login))
        // LinkedIn bridge
        .route("/linkedin/redirecturl", get(linkedin::handle_redirect_url))
        .route("/linkedin/callback", get(linkedin::handle_callback))
        .route("/linkedin/profile/:email", get(linkedin::handle_get_profile))
        .route(
            "/linkedin/linkedin_login",
            post(linkedin::handle_linkedin_login),
        )
        .route("/profile/:email", get(linkedin::handle_get_profile))
        // Résumé extraction
        .route(
            "/router/extract-data/:email_id",
            post(extraction::handle_extract).get(extraction::handle_get_extraction),
        )
        // Assessment flow
        .route("/assessment/start", post(assessment::handle_start))
        .route("/assessment/answer", post(assessment::handle_answer))
        .route("/assessment/job-answer", post(assessment::handle_job_answer))
        .route("/assessment/:email_id", get(assessment::handle_status))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::jwt::issue_token;
    use crate::config::Config;
    use crate::linkedin::enrichment::DisabledEnricher;
    use crate::linkedin::oauth::LinkedInOAuth;
    use crate::llm_client::LlmClient;

    const SECRET: &str = "router-test-secret";

    /// State whose pool and Redis client never connect unless a handler
    /// actually reaches the store.
    fn test_state() -> AppState {
        let config = Config {
            database_url: "postgres://localhost/linkfetch_test".to_string(),
            redis_url: "redis://127.0.0.1/".to_string(),
            openai_api_key: "sk-test".to_string(),
            jwt_secret: SECRET.to_string(),
            jwt_ttl_secs: 3600,
            linkedin_client_id: "client".to_string(),
            linkedin_client_secret: "secret".to_string(),
            linkedin_redirect_uri: "http://localhost/linkedin/callback".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            proxycurl_api_key: None,
            port: 0,
            rust_log: "info".to_string(),
        };
        AppState {
            db: PgPoolOptions::new()
                .connect_lazy(&config.database_url)
                .unwrap(),
            redis: redis::Client::open(config.redis_url.as_str()).unwrap(),
            llm: LlmClient::new(config.openai_api_key.clone()).unwrap(),
            linkedin: LinkedInOAuth::new(
                reqwest::Client::new(),
                config.linkedin_client_id.clone(),
                config.linkedin_client_secret.clone(),
                config.linkedin_redirect_uri.clone(),
            ),
            enricher: Arc::new(DisabledEnricher),
            config,
        }
    }

    async fn send(request: Request<Body>) -> Response {
        build_router(test_state()).oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_verify_token_accepts_query_token() {
        let token = issue_token("ada@example.com", SECRET, 60).unwrap();
        let response = send(
            Request::get(format!("/auth/verify-token?token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Token is valid");
        assert_eq!(body["user"]["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_verify_token_accepts_bearer_header() {
        let token = issue_token("ada@example.com", SECRET, 60).unwrap();
        let response = send(
            Request::get("/auth/verify-token")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_verify_token_reports_expiry() {
        let token = issue_token("ada@example.com", SECRET, -120).unwrap();
        let response = send(
            Request::get(format!("/auth/verify-token?token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await["error"]["message"],
            "Token has expired"
        );
    }

    #[tokio::test]
    async fn test_verify_token_without_token_is_unauthorized() {
        let response = send(
            Request::get("/auth/verify-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"]["message"], "Missing token");
    }

    #[tokio::test]
    async fn test_me_requires_bearer_token() {
        let response = send(Request::get("/auth/me").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            Request::get("/auth/me")
                .header(header::AUTHORIZATION, "Bearer garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"]["message"], "Invalid token");
    }

    #[tokio::test]
    async fn test_signup_rejects_malformed_email_before_storage() {
        let response = send(post_json(
            "/auth/signup",
            r#"{"email": "not-an-email", "password": "correct horse"}"#,
        ))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"]["code"],
            "VALIDATION_ERROR"
        );
    }

    #[tokio::test]
    async fn test_signup_rejects_empty_password() {
        let response = send(post_json(
            "/auth/signup",
            r#"{"email": "ada@example.com", "password": ""}"#,
        ))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_with_malformed_email_is_invalid_credentials() {
        let response = send(post_json(
            "/auth/login",
            r#"{"email": "nobody", "password": "whatever1"}"#,
        ))
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await["error"]["message"],
            "Invalid credentials"
        );
    }

    #[tokio::test]
    async fn test_callback_without_code() {
        let response = send(
            Request::get("/linkedin/callback?state=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"]["message"],
            "Authorization code not found"
        );
    }

    #[tokio::test]
    async fn test_callback_with_provider_error() {
        let response = send(
            Request::get("/linkedin/callback?error=user_cancelled_login&error_description=denied")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_callback_with_malformed_state_is_rejected() {
        let response = send(
            Request::get("/linkedin/callback?code=abc&state=not-a-nonce")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"]["message"],
            "Invalid or expired OAuth state"
        );
    }

    #[tokio::test]
    async fn test_extract_rejects_blank_text() {
        let response = send(post_json(
            "/router/extract-data/ada@example.com",
            r#"{"text": "   "}"#,
        ))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_linkedin_login_rejects_blank_url() {
        let response = send(post_json(
            "/auth/linkedin_login",
            r#"{"email": "ada@example.com", "linked_in_url": " "}"#,
        ))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_assessment_start_rejects_blank_role() {
        let response = send(
            Request::post("/assessment/start?email_id=ada@example.com&job_role=%20")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_assessment_answer_rejects_malformed_email() {
        let response = send(
            Request::post("/assessment/answer?email_id=nobody&answer=yes")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
