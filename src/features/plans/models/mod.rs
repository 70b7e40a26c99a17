mod plan;

pub use plan::{PlanTier, ThumbnailSize};
