use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for `POST /make_temp/{id}/`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateExpiringLinkDto {
    /// Link lifetime; the expiration timestamp is issuance time plus this
    #[validate(range(
        min = 300,
        max = 30000,
        message = "Seconds must be value between 300 and 30000."
    ))]
    #[schema(minimum = 300, maximum = 30000, example = 3600)]
    pub expires_seconds: i64,
}

/// Response body for a freshly issued expiring link
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpiringLinkResponseDto {
    pub url_hash: String,
    pub expiration_date: DateTime<Utc>,
    /// Absolute URL the snapshot can be fetched from until expiry
    pub expiring_link_url: String,
}
