//! Password hashing and session issuance for register/login.

use anyhow::anyhow;
use chrono::{Duration, Utc};
use folio_studio::models::{LoginRequest, RegisterRequest};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;

pub const MIN_PASSWORD_CHARS: usize = 8;
pub const SESSION_TTL_DAYS: i64 = 7;
const BCRYPT_COST: u32 = 10;

/// Trims the fields and lowercases the email. Rejects bodies that can never register.
pub fn validate_registration(request: RegisterRequest) -> Result<RegisterRequest, AppError> {
    let name = request.name.trim().to_string();
    let email = request.email.trim().to_lowercase();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if !looks_like_email(&email) {
        return Err(AppError::Validation("Valid email is required".to_string()));
    }
    if request.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters long"
        )));
    }
    Ok(RegisterRequest {
        name,
        email,
        password: request.password,
    })
}

pub fn validate_login(request: LoginRequest) -> Result<LoginRequest, AppError> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }
    Ok(LoginRequest {
        email,
        password: request.password,
    })
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| anyhow!("password hashing task failed: {e}"))?
        .map_err(|e| AppError::Internal(anyhow!("password hashing failed: {e}")))
}

/// A blank or malformed stored hash never matches.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    if hash.is_empty() {
        return Ok(false);
    }
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| anyhow!("password check task failed: {e}"))?;
    Ok(outcome.unwrap_or_else(|e| {
        debug!("Stored password hash is unreadable: {e}");
        false
    }))
}

pub fn new_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Stores a fresh bearer token for `user_id` and clears that user's expired ones.
pub async fn issue_session(db: &PgPool, user_id: Uuid) -> Result<String, AppError> {
    sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND expires_at <= now()")
        .bind(user_id)
        .execute(db)
        .await?;

    let token = new_session_token();
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(&token)
        .bind(user_id)
        .bind(Utc::now() + Duration::days(SESSION_TTL_DAYS))
        .execute(db)
        .await?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::Validation(message) => message,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_registration_is_normalized() {
        let request =
            validate_registration(registration("  Jane Doe ", " Jane@Example.COM ", "correct horse"))
                .unwrap();
        assert_eq!(request.name, "Jane Doe");
        assert_eq!(request.email, "jane@example.com");
        assert_eq!(request.password, "correct horse");
    }

    #[test]
    fn test_registration_rejections() {
        assert_eq!(
            message(validate_registration(registration(" ", "a@b.co", "password1")).unwrap_err()),
            "Name is required"
        );
        for email in ["", "jane", "jane@", "@example.com", "jane@example", "ja ne@example.com", "a@b@c.com"] {
            assert_eq!(
                message(validate_registration(registration("Jane", email, "password1")).unwrap_err()),
                "Valid email is required",
                "{email}"
            );
        }
        assert_eq!(
            message(validate_registration(registration("Jane", "a@b.co", "short")).unwrap_err()),
            "Password must be at least 8 characters long"
        );
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(validate_registration(registration("Jane", "a@b.co", "ééééééé")).is_err());
        assert!(validate_registration(registration("Jane", "a@b.co", "éééééééé")).is_ok());
    }

    #[test]
    fn test_login_requires_both_fields() {
        let err = validate_login(LoginRequest {
            email: "  ".into(),
            password: "password1".into(),
        })
        .unwrap_err();
        assert_eq!(message(err), "Email and password are required");

        let ok = validate_login(LoginRequest {
            email: "Jane@Example.com".into(),
            password: "password1".into(),
        })
        .unwrap();
        assert_eq!(ok.email, "jane@example.com");
    }

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hash = hash_password("correct horse".into()).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("correct horse".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong horse".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_blank_or_garbled_hash_never_matches() {
        assert!(!verify_password("anything".into(), String::new()).await.unwrap());
        assert!(!verify_password("anything".into(), "not-a-hash".into()).await.unwrap());
    }

    #[test]
    fn test_session_tokens_are_long_and_distinct() {
        let a = new_session_token();
        let b = new_session_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
