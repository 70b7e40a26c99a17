//! Builtin plan tiers. The migration seeds these into the registry; tests and
//! the in-memory repository build them from the same definitions.

use crate::features::plans::models::{PlanTier, ThumbnailSize};
use crate::shared::constants::{PLAN_BASIC, PLAN_ENTERPRISE, PLAN_PREMIUM};

/// Builtin thumbnail heights (width 0: scale preserving aspect ratio)
pub const BUILTIN_THUMBNAIL_HEIGHTS: &[i32] = &[200, 400];

pub fn builtin_plans() -> Vec<PlanTier> {
    let th200 = ThumbnailSize::new(200, 0);
    let th400 = ThumbnailSize::new(400, 0);

    vec![
        PlanTier {
            name: PLAN_BASIC.to_string(),
            thumbnail_sizes: vec![th200.clone()],
            show_original_link: false,
            create_expiring_link: false,
        },
        PlanTier {
            name: PLAN_PREMIUM.to_string(),
            thumbnail_sizes: vec![th200.clone(), th400.clone()],
            show_original_link: true,
            create_expiring_link: false,
        },
        PlanTier {
            name: PLAN_ENTERPRISE.to_string(),
            thumbnail_sizes: vec![th200, th400],
            show_original_link: true,
            create_expiring_link: true,
        },
    ]
}
