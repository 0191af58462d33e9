//! Resume persistence. Every query is scoped to the owning user, so a resume
//! owned by someone else is indistinguishable from a missing one.

use folio_studio::estimate;
use folio_studio::models::{Document, StoredResume};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRow;

pub const DEFAULT_TITLE: &str = "My Resume";

/// A blank document titled `title`, or the default title when it is blank.
pub fn seed_document(title: &str) -> Document {
    let mut document = Document::blank();
    document.title = match title.trim() {
        "" => DEFAULT_TITLE.to_string(),
        t => t.to_string(),
    };
    document
}

pub async fn insert(db: &PgPool, user_id: Uuid, document: Document) -> Result<StoredResume, AppError> {
    let completion = estimate(&document) as i16;
    let row: ResumeRow = sqlx::query_as(
        r#"
        INSERT INTO resumes (id, user_id, document, completion)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, document, completion, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(Json(&document))
    .bind(completion)
    .fetch_one(db)
    .await?;
    Ok(row.into_stored())
}

pub async fn list(db: &PgPool, user_id: Uuid) -> Result<Vec<StoredResume>, AppError> {
    let rows: Vec<ResumeRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, document, completion, created_at, updated_at
        FROM resumes
        WHERE user_id = $1
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(ResumeRow::into_stored).collect())
}

pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<StoredResume, AppError> {
    let row: Option<ResumeRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, document, completion, created_at, updated_at
        FROM resumes
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    row.map(ResumeRow::into_stored)
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}

/// Overwrites the stored document and recomputes its completion summary.
pub async fn save(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    document: &Document,
) -> Result<StoredResume, AppError> {
    let completion = estimate(document) as i16;
    let row: Option<ResumeRow> = sqlx::query_as(
        r#"
        UPDATE resumes
        SET document = $3, completion = $4, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, document, completion, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(Json(document))
    .bind(completion)
    .fetch_optional(db)
    .await?;
    row.map(ResumeRow::into_stored)
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}

/// Deletes the resume and returns what it held, for media cleanup.
pub async fn remove(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<StoredResume, AppError> {
    let row: Option<ResumeRow> = sqlx::query_as(
        r#"
        DELETE FROM resumes
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, document, completion, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    row.map(ResumeRow::into_stored)
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}
