use axum::{extract::State, http::StatusCode, Json};
use folio_studio::models::{AuthGrant, LoginRequest, RegisterRequest, UserProfile};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::credentials;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::{CredentialRow, UserRow};
use crate::state::AppState;

const INVALID_LOGIN: &str = "Invalid email or password";

fn duplicate_email(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return AppError::Validation("User already exists".to_string());
        }
    }
    AppError::Database(e)
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthGrant>), AppError> {
    let request = credentials::validate_registration(request)?;
    let password_hash = credentials::hash_password(request.password).await?;

    let row: UserRow = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, email
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&request.name)
    .bind(&request.email)
    .bind(&password_hash)
    .fetch_one(&state.db)
    .await
    .map_err(duplicate_email)?;

    let token = credentials::issue_session(&state.db, row.id).await?;
    info!("Registered user {}", row.id);
    Ok((
        StatusCode::CREATED,
        Json(AuthGrant {
            token,
            user: row.into(),
        }),
    ))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthGrant>, AppError> {
    let request = credentials::validate_login(request)?;

    let row: Option<CredentialRow> = sqlx::query_as(
        "SELECT id, name, email, password_hash FROM users WHERE email = $1",
    )
    .bind(&request.email)
    .fetch_optional(&state.db)
    .await?;
    let Some(row) = row else {
        return Err(AppError::Validation(INVALID_LOGIN.to_string()));
    };

    if !credentials::verify_password(request.password, row.password_hash.clone()).await? {
        warn!("Failed login for user {}", row.id);
        return Err(AppError::Validation(INVALID_LOGIN.to_string()));
    }

    let token = credentials::issue_session(&state.db, row.id).await?;
    info!("User {} logged in", row.id);
    Ok(Json(AuthGrant {
        token,
        user: row.into(),
    }))
}

/// GET /api/auth/profile
pub async fn handle_profile(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(user)
}
