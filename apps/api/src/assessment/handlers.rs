//! Axum route handlers for the Assessment API.
//!
//! Every call loads the session document, advances it in memory, and writes it
//! back guarded by the row revision. An answer is persisted before any
//! follow-up model call, so a failed generation can be retried by calling the
//! same endpoint again.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::assessment::generator::QuestionGenerator;
use crate::assessment::session::{
    Advance, AssessmentAnalysis, AssessmentSession, Phase, Question, QuestionSet,
};
use crate::auth::normalize_email;
use crate::errors::AppError;
use crate::models::assessment::AssessmentRow;
use crate::state::AppState;
use crate::store::assessments::{find_assessment, save_assessment, start_assessment};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartQuery {
    pub email_id: String,
    pub job_role: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerQuery {
    pub email_id: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub message: String,
    pub question_number: usize,
    pub question: Question,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub message: String,
    pub analysis: AssessmentAnalysis,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnswerResponse {
    Question(QuestionResponse),
    Complete(AnalysisResponse),
}

#[derive(Debug, Serialize)]
pub struct SectionProgress {
    pub answered: usize,
    pub total: usize,
}

impl From<&QuestionSet> for SectionProgress {
    fn from(set: &QuestionSet) -> Self {
        Self {
            answered: set.cursor,
            total: set.questions.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssessmentStatusResponse {
    pub email_id: String,
    pub job_role: String,
    pub phase: Phase,
    pub personality: SectionProgress,
    pub role_specific: Option<SectionProgress>,
    pub current_question: Option<QuestionResponse>,
    pub analysis: Option<AssessmentAnalysis>,
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssessmentStatusResponse {
    fn from_row(row: &AssessmentRow) -> Self {
        let session = &row.session.0;
        let phase = session.phase();
        let active = match phase {
            Phase::Personality => Some(&session.personality),
            Phase::RoleSpecific => session.role_specific.as_ref(),
            _ => None,
        };
        let current_question = active.and_then(|set| {
            set.current().map(|q| QuestionResponse {
                message: "Current question".to_string(),
                question_number: set.cursor + 1,
                question: q.clone(),
            })
        });

        Self {
            email_id: row.email.clone(),
            job_role: row.job_role.clone(),
            phase,
            personality: SectionProgress::from(&session.personality),
            role_specific: session.role_specific.as_ref().map(SectionProgress::from),
            current_question,
            analysis: session.analysis.clone(),
            completed: row.completed,
            started_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /assessment/start?email_id=..&job_role=..
///
/// Generates the psychometric battery and (re)starts the user's session.
pub async fn handle_start(
    State(state): State<AppState>,
    Query(query): Query<StartQuery>,
) -> Result<Json<QuestionResponse>, AppError> {
    let email = normalize_email(&query.email_id)?;
    let job_role = query.job_role.trim();
    if job_role.is_empty() {
        return Err(AppError::Validation("job_role cannot be empty".to_string()));
    }
    start_session(&state.db, &state.llm, &email, job_role)
        .await
        .map(Json)
}

/// POST /assessment/answer?email_id=..&answer=..
///
/// Records a psychometric answer. After the last one, generates the
/// job-role questions and returns the first of them.
pub async fn handle_answer(
    State(state): State<AppState>,
    Query(query): Query<AnswerQuery>,
) -> Result<Json<QuestionResponse>, AppError> {
    let email = normalize_email(&query.email_id)?;
    submit_personality_answer(&state.db, &state.llm, &email, &query.answer)
        .await
        .map(Json)
}

/// POST /assessment/job-answer?email_id=..&answer=..
///
/// Records a job-role answer. After the last one, requests and stores the
/// final analysis.
pub async fn handle_job_answer(
    State(state): State<AppState>,
    Query(query): Query<AnswerQuery>,
) -> Result<Json<AnswerResponse>, AppError> {
    let email = normalize_email(&query.email_id)?;
    submit_role_answer(&state.db, &state.llm, &email, &query.answer)
        .await
        .map(Json)
}

/// GET /assessment/:email_id
pub async fn handle_status(
    State(state): State<AppState>,
    Path(email_id): Path<String>,
) -> Result<Json<AssessmentStatusResponse>, AppError> {
    let email = normalize_email(&email_id)?;
    let row = load_session(&state.db, &email).await?;
    Ok(Json(AssessmentStatusResponse::from_row(&row)))
}

async fn load_session(pool: &PgPool, email: &str) -> Result<AssessmentRow, AppError> {
    find_assessment(pool, email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found or test not started.".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Flow
// ────────────────────────────────────────────────────────────────────────────

async fn start_session(
    pool: &PgPool,
    generator: &dyn QuestionGenerator,
    email: &str,
    job_role: &str,
) -> Result<QuestionResponse, AppError> {
    let questions = generator.personality_questions().await?;
    let session = AssessmentSession::new(job_role.to_string(), questions);
    let first = session
        .personality
        .current()
        .cloned()
        .ok_or_else(|| AppError::Llm("Failed to generate psychometric questions.".to_string()))?;

    start_assessment(pool, email, &session).await?;

    Ok(QuestionResponse {
        message: "Test started".to_string(),
        question_number: 1,
        question: first,
    })
}

async fn submit_personality_answer(
    pool: &PgPool,
    generator: &dyn QuestionGenerator,
    email: &str,
    answer: &str,
) -> Result<QuestionResponse, AppError> {
    let row = load_session(pool, email).await?;
    let mut revision = row.revision;
    let mut session = row.session.0;

    if session.phase() == Phase::AwaitingRoleQuestions {
        info!("Retrying job-role question generation for {email}");
    } else {
        match session.answer_personality(answer)? {
            Advance::Next { number, question } => {
                save_assessment(pool, email, revision, &session).await?;
                return Ok(QuestionResponse {
                    message: "Next question".to_string(),
                    question_number: number,
                    question,
                });
            }
            Advance::SectionComplete => {
                revision = save_assessment(pool, email, revision, &session).await?;
                info!("Psychometric section complete for {email}");
            }
        }
    }

    let questions = generator.role_questions(&session.job_role).await?;
    let first = session.begin_role_questions(questions)?.clone();
    save_assessment(pool, email, revision, &session).await?;

    Ok(QuestionResponse {
        message: "Psychometric test completed. Starting job-role-specific questions.".to_string(),
        question_number: 1,
        question: first,
    })
}

async fn submit_role_answer(
    pool: &PgPool,
    generator: &dyn QuestionGenerator,
    email: &str,
    answer: &str,
) -> Result<AnswerResponse, AppError> {
    let row = load_session(pool, email).await?;
    let mut revision = row.revision;
    let mut session = row.session.0;

    if session.phase() == Phase::AwaitingAnalysis {
        info!("Retrying assessment analysis for {email}");
    } else {
        match session.answer_role(answer)? {
            Advance::Next { number, question } => {
                save_assessment(pool, email, revision, &session).await?;
                return Ok(AnswerResponse::Question(QuestionResponse {
                    message: "Next question".to_string(),
                    question_number: number,
                    question,
                }));
            }
            Advance::SectionComplete => {
                revision = save_assessment(pool, email, revision, &session).await?;
            }
        }
    }

    let analysis = generator.analysis(&session).await?;
    session.complete(analysis.clone())?;
    save_assessment(pool, email, revision, &session).await?;
    info!("Assessment completed for {email}");

    Ok(AnswerResponse::Complete(AnalysisResponse {
        message: "Assessment Complete".to_string(),
        analysis,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use sqlx::types::Json as DbJson;

    use super::*;

    /// Serves fixed batteries; the first `role_failures` role-question calls fail.
    struct FixedGenerator {
        personality: usize,
        role_failures: AtomicUsize,
    }

    impl FixedGenerator {
        fn new(personality: usize, role_failures: usize) -> Self {
            Self {
                personality,
                role_failures: AtomicUsize::new(role_failures),
            }
        }
    }

    #[async_trait]
    impl QuestionGenerator for FixedGenerator {
        async fn personality_questions(&self) -> Result<Vec<Question>, AppError> {
            Ok(session_with(self.personality).personality.questions)
        }

        async fn role_questions(&self, job_role: &str) -> Result<Vec<Question>, AppError> {
            let failing = self
                .role_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(AppError::Llm("model unavailable".to_string()));
            }
            Ok(vec![Question {
                prompt: format!("Describe a hard {job_role} problem"),
                options: Vec::new(),
            }])
        }

        async fn analysis(
            &self,
            session: &AssessmentSession,
        ) -> Result<AssessmentAnalysis, AppError> {
            Ok(AssessmentAnalysis {
                skills: vec![crate::assessment::session::ScoredItem {
                    name: session.job_role.clone(),
                    percentage: 80,
                }],
                ..AssessmentAnalysis::default()
            })
        }
    }

    async fn stored_session(pool: &PgPool) -> AssessmentRow {
        find_assessment(pool, "qa@example.com")
            .await
            .unwrap()
            .expect("session stored")
    }

    fn row_for(session: AssessmentSession) -> AssessmentRow {
        AssessmentRow {
            email: "qa@example.com".to_string(),
            job_role: session.job_role.clone(),
            completed: session.is_completed(),
            session: DbJson(session),
            revision: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn session_with(personality: usize) -> AssessmentSession {
        AssessmentSession::new(
            "QA Engineer".to_string(),
            (0..personality)
                .map(|i| Question {
                    prompt: format!("P{i}"),
                    options: vec!["Yes".into(), "No".into()],
                })
                .collect(),
        )
    }

    #[test]
    fn test_status_reports_current_question() {
        let mut session = session_with(3);
        session.answer_personality("Yes").unwrap();

        let status = AssessmentStatusResponse::from_row(&row_for(session));
        assert_eq!(status.phase, Phase::Personality);
        assert_eq!(status.personality.answered, 1);
        assert_eq!(status.personality.total, 3);
        let current = status.current_question.unwrap();
        assert_eq!(current.question_number, 2);
        assert_eq!(current.question.prompt, "P1");
        assert!(!status.completed);
    }

    #[test]
    fn test_status_has_no_question_while_awaiting_generation() {
        let mut session = session_with(1);
        session.answer_personality("No").unwrap();

        let status = AssessmentStatusResponse::from_row(&row_for(session));
        assert_eq!(status.phase, Phase::AwaitingRoleQuestions);
        assert!(status.current_question.is_none());
        assert!(status.role_specific.is_none());
    }

    #[test]
    fn test_answer_response_serializes_untagged() {
        let response = AnswerResponse::Complete(AnalysisResponse {
            message: "Assessment Complete".to_string(),
            analysis: AssessmentAnalysis::default(),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["message"], "Assessment Complete");
        assert!(json["analysis"]["skills"].is_array());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_role_generation_retry_keeps_personality_answers(pool: PgPool) {
        let generator = FixedGenerator::new(2, 1);
        start_session(&pool, &generator, "qa@example.com", "QA Engineer")
            .await
            .unwrap();

        let next = submit_personality_answer(&pool, &generator, "qa@example.com", "Yes")
            .await
            .unwrap();
        assert_eq!(next.question_number, 2);

        // Last answer is stored even though role generation fails.
        let err = submit_personality_answer(&pool, &generator, "qa@example.com", "No")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
        let row = stored_session(&pool).await;
        assert_eq!(row.session.0.phase(), Phase::AwaitingRoleQuestions);
        assert_eq!(row.session.0.personality.answers, vec!["Yes", "No"]);

        // The retry generates role questions without recording another answer.
        let first = submit_personality_answer(&pool, &generator, "qa@example.com", "Ignored")
            .await
            .unwrap();
        assert_eq!(first.question_number, 1);
        assert_eq!(first.question.prompt, "Describe a hard QA Engineer problem");

        let row = stored_session(&pool).await;
        assert_eq!(row.session.0.phase(), Phase::RoleSpecific);
        assert_eq!(row.session.0.personality.answers.len(), 2);
        assert_eq!(row.session.0.personality.cursor, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_full_flow_completes_assessment(pool: PgPool) {
        let generator = FixedGenerator::new(1, 0);
        start_session(&pool, &generator, "qa@example.com", "QA Engineer")
            .await
            .unwrap();
        submit_personality_answer(&pool, &generator, "qa@example.com", "Yes")
            .await
            .unwrap();

        let done = submit_role_answer(&pool, &generator, "qa@example.com", "Flaky tests")
            .await
            .unwrap();
        match done {
            AnswerResponse::Complete(body) => {
                assert_eq!(body.analysis.skills[0].name, "QA Engineer");
            }
            AnswerResponse::Question(_) => panic!("expected the analysis"),
        }

        let row = stored_session(&pool).await;
        assert!(row.completed);
        assert_eq!(row.session.0.phase(), Phase::Completed);

        let err = submit_role_answer(&pool, &generator, "qa@example.com", "More")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_answer_without_session_is_not_found(pool: PgPool) {
        let generator = FixedGenerator::new(1, 0);
        let err = submit_personality_answer(&pool, &generator, "qa@example.com", "Yes")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
