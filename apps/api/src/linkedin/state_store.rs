//! Single-use OAuth `state` nonces kept in Redis with a short TTL.

use redis::AsyncCommands;
use uuid::Uuid;

use crate::errors::AppError;

const KEY_PREFIX: &str = "linkfetch:oauth_state:";
/// Seconds a user has to complete the provider consent screen.
pub const STATE_TTL_SECS: u64 = 600;

fn state_key(nonce: &str) -> String {
    format!("{KEY_PREFIX}{nonce}")
}

/// Mints and records a fresh nonce.
pub async fn issue_state(redis: &redis::Client) -> Result<String, AppError> {
    let nonce = Uuid::new_v4().simple().to_string();
    let mut conn = redis.get_multiplexed_async_connection().await?;
    conn.set_ex::<_, _, ()>(state_key(&nonce), "1", STATE_TTL_SECS)
        .await?;
    Ok(nonce)
}

/// Consumes `nonce`. Returns `false` when it was never issued, already used, or expired.
pub async fn consume_state(redis: &redis::Client, nonce: &str) -> Result<bool, AppError> {
    if !is_well_formed(nonce) {
        return Ok(false);
    }
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let stored: Option<String> = redis::cmd("GETDEL")
        .arg(state_key(nonce))
        .query_async(&mut conn)
        .await?;
    Ok(stored.is_some())
}

fn is_well_formed(nonce: &str) -> bool {
    nonce.len() == 32 && nonce.chars().all(|c| c.is_ascii_hexdigit())
}
