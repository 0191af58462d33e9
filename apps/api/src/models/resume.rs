use chrono::{DateTime, Utc};
use folio_studio::models::{Document, StoredResume};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub document: Json<Document>,
    pub completion: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeRow {
    /// The wire form. Rows written by older builds are re-normalized on the way out.
    pub fn into_stored(self) -> StoredResume {
        let mut document = self.document.0;
        document.normalize();
        StoredResume {
            id: self.id,
            document,
            completion: self.completion.clamp(0, 100) as u8,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
