use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::assessment::session::AssessmentSession;
use crate::errors::AppError;
use crate::models::assessment::AssessmentRow;

pub async fn find_assessment(
    pool: &PgPool,
    email: &str,
) -> Result<Option<AssessmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AssessmentRow>("SELECT * FROM assessments WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Creates the session for `email`, replacing any earlier one.
/// Returns the new revision.
pub async fn start_assessment(
    pool: &PgPool,
    email: &str,
    session: &AssessmentSession,
) -> Result<i64, sqlx::Error> {
    let revision: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO assessments (email, job_role, session, completed, revision)
        VALUES ($1, $2, $3, FALSE, 0)
        ON CONFLICT (email) DO UPDATE SET
            job_role = EXCLUDED.job_role,
            session = EXCLUDED.session,
            completed = FALSE,
            revision = assessments.revision + 1,
            created_at = NOW(),
            updated_at = NOW()
        RETURNING revision
        "#,
    )
    .bind(email)
    .bind(&session.job_role)
    .bind(Json(session))
    .fetch_one(pool)
    .await?;

    info!("Started assessment for {email} (revision {revision})");
    Ok(revision)
}

/// Writes `session` back only if nobody else has written since `expected_revision`.
/// Returns the new revision, or `AppError::Conflict` when the session moved underneath us.
pub async fn save_assessment(
    pool: &PgPool,
    email: &str,
    expected_revision: i64,
    session: &AssessmentSession,
) -> Result<i64, AppError> {
    let revision: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE assessments
        SET session = $1, completed = $2, revision = revision + 1, updated_at = NOW()
        WHERE email = $3 AND revision = $4
        RETURNING revision
        "#,
    )
    .bind(Json(session))
    .bind(session.is_completed())
    .bind(email)
    .bind(expected_revision)
    .fetch_optional(pool)
    .await?;

    revision.ok_or_else(|| {
        warn!("Concurrent assessment update rejected for {email} at revision {expected_revision}");
        AppError::Conflict(
            "Assessment was updated by another request; fetch the current question and retry"
                .to_string(),
        )
    })
}
