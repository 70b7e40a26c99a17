use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::plans::models::PlanTier;
use crate::features::plans::repository::PlanRepository;
use crate::shared::constants::TOP_TIER_PLAN;

/// Plan Resolver: maps an authenticated user to their effective plan tier.
pub struct PlanService {
    plans: Arc<dyn PlanRepository>,
}

impl PlanService {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    /// Staff users hold the builtin top tier without consulting the
    /// assignment table. Everyone else must have an assignment; resolving a
    /// user without one is an error, not an empty plan.
    pub async fn resolve(&self, user: &AuthenticatedUser) -> Result<PlanTier> {
        if user.is_staff() {
            return self
                .plans
                .find_by_name(TOP_TIER_PLAN)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(format!("builtin plan '{}' is missing", TOP_TIER_PLAN))
                });
        }

        self.plans
            .find_assigned(&user.sub)
            .await?
            .ok_or_else(|| AppError::UnassignedPlan(format!("user {} has no plan", user.sub)))
    }
}
