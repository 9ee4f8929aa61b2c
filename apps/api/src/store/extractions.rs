use sqlx::PgPool;

use crate::models::extraction::ExtractionRow;

/// Replaces the stored extraction for `email` with the latest one.
pub async fn upsert_extraction(
    pool: &PgPool,
    email: &str,
    input_text: &str,
    extracted_data: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO extractions (email, input_text, extracted_data)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET
            input_text = EXCLUDED.input_text,
            extracted_data = EXCLUDED.extracted_data,
            updated_at = NOW()
        "#,
    )
    .bind(email)
    .bind(input_text)
    .bind(extracted_data)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_extraction(
    pool: &PgPool,
    email: &str,
) -> Result<Option<ExtractionRow>, sqlx::Error> {
    sqlx::query_as::<_, ExtractionRow>("SELECT * FROM extractions WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}
