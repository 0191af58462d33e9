//! Bearer-token authentication.
//!
//! Register and login issue opaque tokens stored in `sessions`. Handlers
//! take an `AuthUser` argument to require a signed-in caller.

pub mod credentials;
pub mod handlers;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use folio_studio::models::UserProfile;
use sqlx::PgPool;
use tracing::debug;

use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

/// The caller of an authenticated route.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserProfile);

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

async fn resolve(db: &PgPool, token: &str) -> Result<Option<UserProfile>, AppError> {
    let row: Option<UserRow> = sqlx::query_as(
        r#"
        SELECT u.id, u.name, u.email
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = $1 AND s.expires_at > now()
        "#,
    )
    .bind(token)
    .fetch_optional(db)
    .await?;
    Ok(row.map(UserProfile::from))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AppError::Unauthorized)?;

        match resolve(&state.db, token).await? {
            Some(user) => Ok(AuthUser(user)),
            None => {
                debug!("Rejected unknown or expired bearer token");
                Err(AppError::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("bearer  abc123 "), Some("abc123"));
        assert_eq!(bearer_token("Basic abc123"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc123"), None);
    }
}
