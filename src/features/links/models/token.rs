use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A time-bounded, hash-addressed pointer to a snapshot of an image's decoded
/// bytes. Created once, never updated; dead as soon as `expiration_date` is
/// at or before the current time. The snapshot is a copy, so mutating or
/// deleting the source image does not affect a pending token.
#[derive(Debug, Clone, FromRow)]
pub struct ExpiringLinkToken {
    pub url_hash: String,
    pub expiration_date: DateTime<Utc>,
    pub image: Vec<u8>,
    pub created_at: DateTime<Utc>,
}
