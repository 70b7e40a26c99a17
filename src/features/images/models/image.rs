use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Uploaded image metadata. The binary itself lives in the media store at
/// `file_path`; every record has exactly one owner.
#[derive(Debug, Clone, FromRow)]
pub struct ImageRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

impl ImageRecord {
    pub fn new(owner_id: String, name: String, file_path: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            file_path,
            created_at: Utc::now(),
        }
    }
}
