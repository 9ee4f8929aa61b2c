use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::auth::normalize_email;
use crate::errors::AppError;
use crate::extraction::models::ExtractedProfile;
use crate::extraction::prompts::{EXTRACTION_PROMPT, EXTRACTION_SYSTEM};
use crate::llm_client::LlmClient;
use crate::models::extraction::ExtractionRow;
use crate::state::AppState;
use crate::store::extractions::{find_extraction, upsert_extraction};

/// Upper bound on input text accepted for a single extraction.
const MAX_INPUT_CHARS: usize = 50_000;
const EXTRACTION_TEMPERATURE: f32 = 0.0;

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub extracted_data: ExtractedProfile,
}

/// POST /router/extract-data/:email_id
pub async fn handle_extract(
    State(state): State<AppState>,
    Path(email_id): Path<String>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, AppError> {
    let email = normalize_email(&email_id)?;
    let text = validate_text(&request.text)?;

    let extracted = extract_profile(&state.llm, text).await?;
    store_extraction(&state.db, &email, &request.text, &extracted).await?;

    Ok(Json(ExtractResponse {
        extracted_data: extracted,
    }))
}

/// GET /router/extract-data/:email_id
pub async fn handle_get_extraction(
    State(state): State<AppState>,
    Path(email_id): Path<String>,
) -> Result<Json<ExtractionRow>, AppError> {
    let email = normalize_email(&email_id)?;
    find_extraction(&state.db, &email)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No extraction stored for {email}")))
}

pub async fn extract_profile(llm: &LlmClient, text: &str) -> Result<ExtractedProfile, AppError> {
    let prompt = EXTRACTION_PROMPT.replace("{raw_text}", text);
    llm.call_json::<ExtractedProfile>(&prompt, EXTRACTION_SYSTEM, EXTRACTION_TEMPERATURE)
        .await
        .map_err(|e| AppError::Llm(format!("Profile extraction failed: {e}")))
}

/// Stores `input_text` exactly as submitted next to the parsed profile.
async fn store_extraction(
    pool: &PgPool,
    email: &str,
    input_text: &str,
    extracted: &ExtractedProfile,
) -> Result<(), AppError> {
    let document = serde_json::to_value(extracted)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode extraction: {e}")))?;

    upsert_extraction(pool, email, input_text, &document).await?;
    info!("Stored extraction for {email}");
    Ok(())
}

/// The trimmed text handed to the model.
fn validate_text(text: &str) -> Result<&str, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }
    if text.chars().count() > MAX_INPUT_CHARS {
        return Err(AppError::Validation(format!(
            "text exceeds {MAX_INPUT_CHARS} characters"
        )));
    }
    Ok(text)
}
