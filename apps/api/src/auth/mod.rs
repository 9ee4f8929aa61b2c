// Identity: password accounts, bearer tokens, and the authenticated-user extractor.

pub mod extractor;
pub mod handlers;
pub mod jwt;
pub mod password;

use crate::errors::AppError;

/// Emails key every stored document, so they are trimmed and lower-cased
/// before use. Rejects values that are not plausibly an address.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::Validation(format!("Invalid email address: {raw}")));
    }
    Ok(email)
}
