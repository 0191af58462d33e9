use folio_studio::models::UserProfile;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        UserProfile {
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}

/// A user together with the stored password hash, for login only.
#[derive(Debug, Clone, FromRow)]
pub struct CredentialRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl From<CredentialRow> for UserProfile {
    fn from(row: CredentialRow) -> Self {
        UserProfile {
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}
