// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Admin role - full access to every image, plan bypass included
pub const ROLE_ADMIN: &str = "admin";

/// Staff role - resolves to the builtin top plan tier without an assignment
pub const ROLE_STAFF: &str = "staff";

// =============================================================================
// PLAN CONSTANTS
// =============================================================================

/// Builtin plan tier names, seeded by migration
pub const PLAN_BASIC: &str = "Basic";
pub const PLAN_PREMIUM: &str = "Premium";
pub const PLAN_ENTERPRISE: &str = "Enterprise";

/// The tier staff users implicitly hold
pub const TOP_TIER_PLAN: &str = PLAN_ENTERPRISE;

// =============================================================================
// EXPIRING LINK CONSTANTS
// =============================================================================

/// Inclusive bounds for an expiring link's time-to-live, in seconds
pub const MIN_EXPIRES_SECONDS: i64 = 300;
pub const MAX_EXPIRES_SECONDS: i64 = 30000;

/// Validation message for an out-of-range ttl (wording is part of the API)
pub const EXPIRES_SECONDS_MESSAGE: &str = "Seconds must be value between 300 and 30000.";

/// Attempts before giving up when a generated url hash collides
pub const HASH_RETRY_ATTEMPTS: u32 = 3;

// =============================================================================
// IMAGE CONSTANTS
// =============================================================================

/// Display name length cap; longer filenames are truncated with a "..." prefix
pub const MAX_IMAGE_NAME_LEN: usize = 50;
