use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::images::models::ImageRecord;

#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn insert(&self, image: &ImageRecord) -> Result<()>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ImageRecord>>;
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ImageRecord>>;
}

pub struct PgImageRepository {
    pool: PgPool,
}

impl PgImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageRepository for PgImageRepository {
    async fn insert(&self, image: &ImageRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO images (id, owner_id, name, file_path, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(image.id)
        .bind(&image.owner_id)
        .bind(&image.name)
        .bind(&image.file_path)
        .bind(image.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ImageRecord>> {
        let image = sqlx::query_as::<_, ImageRecord>(
            r#"
            SELECT id, owner_id, name, file_path, created_at
            FROM images
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(image)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ImageRecord>> {
        let images = sqlx::query_as::<_, ImageRecord>(
            r#"
            SELECT id, owner_id, name, file_path, created_at
            FROM images
            WHERE owner_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }
}
