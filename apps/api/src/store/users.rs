use sqlx::PgPool;
use tracing::info;

use crate::models::user::UserRow;

pub async fn find_user(pool: &PgPool, email: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Parameters for registering a password-holding user.
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub linked_in_url: Option<&'a str>,
    pub linked_in_data: Option<&'a serde_json::Value>,
}

/// Registers a user. A row left behind by the LinkedIn flows (no password yet)
/// is claimed; a row that already holds a password is left untouched.
/// Returns `false` when the email is already registered.
pub async fn register_user(pool: &PgPool, user: NewUser<'_>) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, linked_in_url, linked_in_data)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET
            password_hash = EXCLUDED.password_hash,
            linked_in_url = COALESCE(EXCLUDED.linked_in_url, users.linked_in_url),
            linked_in_data = COALESCE(EXCLUDED.linked_in_data, users.linked_in_data),
            updated_at = NOW()
        WHERE users.password_hash IS NULL
        "#,
    )
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.linked_in_url)
    .bind(user.linked_in_data)
    .execute(pool)
    .await?;

    let created = result.rows_affected() == 1;
    if created {
        info!("Registered user {}", user.email);
    }
    Ok(created)
}

/// Stores the LinkedIn URL and enrichment snapshot, creating the user if needed.
pub async fn upsert_linked_in(
    pool: &PgPool,
    email: &str,
    linked_in_url: &str,
    linked_in_data: Option<&serde_json::Value>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (email, linked_in_url, linked_in_data)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET
            linked_in_url = EXCLUDED.linked_in_url,
            linked_in_data = EXCLUDED.linked_in_data,
            updated_at = NOW()
        "#,
    )
    .bind(email)
    .bind(linked_in_url)
    .bind(linked_in_data)
    .execute(pool)
    .await?;

    info!("Stored LinkedIn snapshot for {email}");
    Ok(())
}

/// Stores the OAuth `userinfo` snapshot, creating the user if needed.
pub async fn upsert_oauth_profile(
    pool: &PgPool,
    email: &str,
    profile: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (email, oauth_profile)
        VALUES ($1, $2)
        ON CONFLICT (email) DO UPDATE SET
            oauth_profile = EXCLUDED.oauth_profile,
            updated_at = NOW()
        "#,
    )
    .bind(email)
    .bind(profile)
    .execute(pool)
    .await?;

    info!("Stored OAuth profile snapshot for {email}");
    Ok(())
}
