use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::assessment::session::AssessmentSession;

#[derive(Debug, Clone, FromRow)]
pub struct AssessmentRow {
    pub email: String,
    pub job_role: String,
    pub session: Json<AssessmentSession>,
    pub completed: bool,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
