use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use folio_studio::models::{NewResume, ResumePatch, StoredResume, UploadedImage};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::media::{sniff, MediaStore};
use crate::resumes::store;
use crate::state::AppState;

/// Multipart field carrying the uploaded image.
const IMAGE_FIELD: &str = "image";

/// POST /api/resume
pub async fn handle_create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Option<Json<NewResume>>,
) -> Result<(StatusCode, Json<StoredResume>), AppError> {
    let title = body.map(|Json(req)| req.title).unwrap_or_default();
    let stored = store::insert(&state.db, user.id, store::seed_document(&title)).await?;
    info!("Created resume {} for user {}", stored.id, user.id);
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/resume
pub async fn handle_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<StoredResume>>, AppError> {
    Ok(Json(store::list(&state.db, user.id).await?))
}

/// GET /api/resume/:id
pub async fn handle_get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredResume>, AppError> {
    Ok(Json(store::find(&state.db, user.id, id).await?))
}

/// PUT /api/resume/:id
pub async fn handle_update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<ResumePatch>,
) -> Result<Json<StoredResume>, AppError> {
    let current = store::find(&state.db, user.id, id).await?;
    let merged = patch
        .apply_to(&current.document)
        .map_err(|e| AppError::Validation(format!("Invalid resume data: {e}")))?;
    let stored = store::save(&state.db, user.id, id, &merged).await?;
    discard_thumbnail(
        state.media.as_ref(),
        id,
        &current.document.thumbnail_ref,
        &stored.document.thumbnail_ref,
    )
    .await;
    info!("Updated resume {id} (completion {}%)", stored.completion);
    Ok(Json(stored))
}

/// DELETE /api/resume/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let removed = store::remove(&state.db, user.id, id).await?;
    discard_thumbnail(state.media.as_ref(), id, &removed.document.thumbnail_ref, "").await;
    info!("Deleted resume {id}");
    Ok(Json(json!({ "message": "Resume deleted successfully" })))
}

/// Deletes `old` once the row no longer points at it. The row is already
/// written, so a failed delete is only logged.
async fn discard_thumbnail(media: &dyn MediaStore, id: Uuid, old: &str, current: &str) {
    let old = old.trim();
    if old.is_empty() || old == current.trim() {
        return;
    }
    if let Err(e) = media.delete_url(old).await {
        warn!("Failed to delete thumbnail for resume {id}: {e}");
    }
}

/// POST /api/resume/upload-image
pub async fn handle_upload_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UploadedImage>, AppError> {
    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?;
            image = Some(bytes);
            break;
        }
    }

    let bytes = image
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::Validation("No image uploaded".to_string()))?;
    let kind = sniff(&bytes).ok_or_else(|| {
        AppError::Validation("Only .jpeg, .jpg and .png formats are allowed".to_string())
    })?;

    let key = format!("thumbnails/{}/{}.{}", user.id, Uuid::new_v4(), kind.extension());
    let url = state.media.put(&key, bytes.to_vec(), kind).await?;
    Ok(Json(UploadedImage { url }))
}
