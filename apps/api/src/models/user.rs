use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub email: String,
    pub password_hash: Option<String>,
    pub linked_in_url: Option<String>,
    pub linked_in_data: Option<Value>,
    pub oauth_profile: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub email: String,
    pub linked_in_url: Option<String>,
    pub has_linked_in_data: bool,
    pub oauth_profile: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            email: row.email,
            linked_in_url: row.linked_in_url,
            has_linked_in_data: row.linked_in_data.as_ref().is_some_and(|d| !d.is_null()),
            oauth_profile: row.oauth_profile,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
