use sqlx::FromRow;
use uuid::Uuid;

/// A target (height, width) pair for a derived thumbnail view. Zero on either
/// axis means "unconstrained - preserve aspect ratio against the other axis".
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ThumbnailSize {
    pub id: Uuid,
    pub height: i32,
    pub width: i32,
}

impl ThumbnailSize {
    pub fn new(height: i32, width: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            height,
            width,
        }
    }
}

/// A named bundle of viewing capabilities and thumbnail sizes. Capability
/// flags and the size set are read at response-build time, never cached
/// beyond a single request.
#[derive(Debug, Clone)]
pub struct PlanTier {
    pub name: String,
    pub thumbnail_sizes: Vec<ThumbnailSize>,
    pub show_original_link: bool,
    pub create_expiring_link: bool,
}
