use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::core::error::Result;
use crate::features::plans::models::{PlanTier, ThumbnailSize};

/// Read access to the plan registry and the user->plan assignment table.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Fetch a tier by name, sizes included
    async fn find_by_name(&self, name: &str) -> Result<Option<PlanTier>>;

    /// Fetch the tier assigned to a user, sizes included
    async fn find_assigned(&self, user_id: &str) -> Result<Option<PlanTier>>;
}

pub struct PgPlanRepository {
    pool: PgPool,
}

#[derive(FromRow)]
struct PlanTierRow {
    name: String,
    show_original_link: bool,
    create_expiring_link: bool,
}

impl PgPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_sizes(&self, plan_name: &str) -> Result<Vec<ThumbnailSize>> {
        let sizes = sqlx::query_as::<_, ThumbnailSize>(
            r#"
            SELECT ts.id, ts.height, ts.width
            FROM thumbnail_sizes ts
            JOIN plan_tier_sizes pts ON pts.size_id = ts.id
            WHERE pts.plan_name = $1
            ORDER BY pts.position
            "#,
        )
        .bind(plan_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(sizes)
    }

    async fn hydrate(&self, row: PlanTierRow) -> Result<PlanTier> {
        let thumbnail_sizes = self.load_sizes(&row.name).await?;
        Ok(PlanTier {
            name: row.name,
            thumbnail_sizes,
            show_original_link: row.show_original_link,
            create_expiring_link: row.create_expiring_link,
        })
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<PlanTier>> {
        let row = sqlx::query_as::<_, PlanTierRow>(
            r#"
            SELECT name, show_original_link, create_expiring_link
            FROM plan_tiers
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_assigned(&self, user_id: &str) -> Result<Option<PlanTier>> {
        let row = sqlx::query_as::<_, PlanTierRow>(
            r#"
            SELECT pt.name, pt.show_original_link, pt.create_expiring_link
            FROM plan_tiers pt
            JOIN plan_assignments pa ON pa.plan_name = pt.name
            WHERE pa.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }
}
