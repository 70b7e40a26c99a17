use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::core::error::{AppError, Result};
use crate::features::images::models::ImageRecord;
use crate::features::links::models::ExpiringLinkToken;
use crate::features::links::repository::TokenRepository;
use crate::modules::media::MediaStore;
use crate::shared::constants::{
    EXPIRES_SECONDS_MESSAGE, HASH_RETRY_ATTEMPTS, MAX_EXPIRES_SECONDS, MIN_EXPIRES_SECONDS,
};

/// Expiring Link Issuer: mints hash-addressed, time-limited tokens over a
/// snapshot of an image's decoded bytes, and serves those bytes back until
/// the expiration instant.
pub struct LinkService {
    tokens: Arc<dyn TokenRepository>,
    media: Arc<MediaStore>,
    base_url: String,
}

impl LinkService {
    pub fn new(
        tokens: Arc<dyn TokenRepository>,
        media: Arc<MediaStore>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            tokens,
            media,
            base_url: base_url.into(),
        }
    }

    pub async fn issue(
        &self,
        image: &ImageRecord,
        expires_seconds: i64,
    ) -> Result<ExpiringLinkToken> {
        if !(MIN_EXPIRES_SECONDS..=MAX_EXPIRES_SECONDS).contains(&expires_seconds) {
            return Err(AppError::Validation(EXPIRES_SECONDS_MESSAGE.to_string()));
        }

        // Snapshot the decoded pixel content now; later mutation or deletion
        // of the source image must not affect a pending token
        let snapshot = self.media.decoded_pixels(&image.file_path).await?;

        // Wall-clock nanos feed the hash, so a collision means we raced an
        // identical issuance; regenerate with a fresh timestamp and retry.
        let mut attempt = 0;
        loop {
            let now = Utc::now();
            let token = ExpiringLinkToken {
                url_hash: url_hash(image, now),
                expiration_date: now + Duration::seconds(expires_seconds),
                image: snapshot.clone(),
                created_at: now,
            };

            match self.tokens.insert(&token).await {
                Ok(()) => {
                    info!(
                        "expiring link issued: image={}, hash={}, expires={}",
                        image.id, token.url_hash, token.expiration_date
                    );
                    return Ok(token);
                }
                Err(AppError::Conflict(msg)) => {
                    attempt += 1;
                    if attempt >= HASH_RETRY_ATTEMPTS {
                        return Err(AppError::Conflict(msg));
                    }
                    warn!("url hash collision for image {}, retrying", image.id);
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn redeem(&self, hash: &str) -> Result<Vec<u8>> {
        self.tokens
            .find_live(hash, Utc::now())
            .await?
            .map(|token| token.image)
            .ok_or_else(|| AppError::NotFound("link not found".to_string()))
    }

    pub fn expiring_link_url(&self, hash: &str) -> String {
        format!("{}/temp/{}/", self.base_url, hash)
    }
}

fn url_hash(image: &ImageRecord, now: DateTime<Utc>) -> String {
    let nanos = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros());

    let mut hasher = Sha256::new();
    hasher.update(image.file_path.as_bytes());
    hasher.update(image.name.as_bytes());
    hasher.update(image.owner_id.as_bytes());
    hasher.update(nanos.to_be_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{encode_test_png, InMemoryTokenRepository};

    fn test_image() -> ImageRecord {
        ImageRecord::new(
            "test".to_string(),
            "macara".to_string(),
            "user_test/macara.png".to_string(),
        )
    }

    async fn setup(
        dir: &tempfile::TempDir,
    ) -> (LinkService, Arc<InMemoryTokenRepository>, ImageRecord) {
        let media = Arc::new(MediaStore::new(dir.path()));
        let image = test_image();
        media
            .save(&image.file_path, &encode_test_png(4, 4))
            .await
            .unwrap();
        let tokens = Arc::new(InMemoryTokenRepository::new());
        let service = LinkService::new(tokens.clone(), media, "http://testserver");
        (service, tokens, image)
    }

    #[tokio::test]
    async fn out_of_range_ttl_is_rejected_without_a_write() {
        let dir = tempfile::tempdir().unwrap();
        let (service, tokens, image) = setup(&dir).await;

        for ttl in [0, 299, 30001, -5] {
            let err = service.issue(&image, ttl).await.unwrap_err();
            match err {
                AppError::Validation(msg) => assert_eq!(msg, EXPIRES_SECONDS_MESSAGE),
                other => panic!("unexpected error for ttl {}: {:?}", ttl, other),
            }
        }
        assert_eq!(tokens.len().await, 0);
    }

    #[tokio::test]
    async fn boundary_ttls_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _, image) = setup(&dir).await;

        for ttl in [300, 30000, 15000] {
            let token = service.issue(&image, ttl).await.unwrap();
            let lifetime = token.expiration_date - token.created_at;
            assert_eq!(lifetime.num_seconds(), ttl);
        }
    }

    #[tokio::test]
    async fn fresh_token_redeems_to_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _, image) = setup(&dir).await;

        let token = service.issue(&image, 300).await.unwrap();
        let bytes = service.redeem(&token.url_hash).await.unwrap();

        assert_eq!(bytes, token.image);
        assert_eq!(bytes.len(), 4 * 4 * 3); // decoded RGB8, not the PNG file

        // Not single-use: a live token redeems repeatedly
        assert_eq!(service.redeem(&token.url_hash).await.unwrap(), bytes);
    }

    #[tokio::test]
    async fn two_issuances_yield_distinct_hashes_and_equal_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _, image) = setup(&dir).await;

        let first = service.issue(&image, 300).await.unwrap();
        let second = service.issue(&image, 300).await.unwrap();

        assert_ne!(first.url_hash, second.url_hash);
        assert_eq!(
            service.redeem(&first.url_hash).await.unwrap(),
            service.redeem(&second.url_hash).await.unwrap()
        );
    }

    #[tokio::test]
    async fn expired_token_is_indistinguishable_from_absent() {
        let dir = tempfile::tempdir().unwrap();
        let (service, tokens, image) = setup(&dir).await;

        let token = service.issue(&image, 300).await.unwrap();
        // Force the boundary: at exactly the expiration instant the token
        // already counts as expired
        tokens.set_expiration(&token.url_hash, Utc::now()).await;

        let err = service.redeem(&token.url_hash).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service.redeem("no-such-hash").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn hash_collision_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let (service, tokens, image) = setup(&dir).await;
        tokens.fail_next_inserts(1).await;

        let token = service.issue(&image, 300).await.unwrap();
        assert_eq!(tokens.len().await, 1);
        assert!(service.redeem(&token.url_hash).await.is_ok());
    }

    #[tokio::test]
    async fn persistent_collision_gives_up() {
        let dir = tempfile::tempdir().unwrap();
        let (service, tokens, image) = setup(&dir).await;
        tokens.fail_next_inserts(HASH_RETRY_ATTEMPTS).await;

        let err = service.issue(&image, 300).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
