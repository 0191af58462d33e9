pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

/// Thumbnails are rendered at twice page size, which outgrows the default body limit.
const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/profile", get(auth::handle_profile))
        .route(
            "/api/resume",
            post(resumes::handle_create).get(resumes::handle_list),
        )
        .route(
            "/api/resume/upload-image",
            post(resumes::handle_upload_image).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/api/resume/:id",
            get(resumes::handle_get)
                .put(resumes::handle_update)
                .delete(resumes::handle_delete),
        )
        .with_state(state)
}
