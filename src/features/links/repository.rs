use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::links::models::ExpiringLinkToken;

#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Store a freshly issued token. A url_hash collision surfaces as
    /// `AppError::Conflict` so the issuer can retry with a new hash.
    async fn insert(&self, token: &ExpiringLinkToken) -> Result<()>;

    /// Fetch a token that is still live at `now`. Expired tokens are
    /// indistinguishable from absent ones.
    async fn find_live(
        &self,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ExpiringLinkToken>>;
}

pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn insert(&self, token: &ExpiringLinkToken) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO expiring_link_tokens (url_hash, expiration_date, image, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&token.url_hash)
        .bind(token.expiration_date)
        .bind(&token.image)
        .bind(token.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db))
                if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                Err(AppError::Conflict(format!(
                    "url hash {} already exists",
                    token.url_hash
                )))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    async fn find_live(
        &self,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ExpiringLinkToken>> {
        // Strict comparison: a token is already dead at its expiration instant
        let token = sqlx::query_as::<_, ExpiringLinkToken>(
            r#"
            SELECT url_hash, expiration_date, image, created_at
            FROM expiring_link_tokens
            WHERE url_hash = $1 AND expiration_date > $2
            "#,
        )
        .bind(hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }
}
