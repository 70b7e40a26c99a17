#![cfg(test)]
//! In-memory collaborators and router plumbing for tests. The repositories
//! mirror the Postgres implementations' contracts (Conflict on duplicate
//! hash, strict expiry comparison) so services behave identically against
//! either.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, Router};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::images::handlers::ImagesState;
use crate::features::images::models::ImageRecord;
use crate::features::images::repository::ImageRepository;
use crate::features::images::services::{ImageService, ViewService};
use crate::features::links::handlers::LinksState;
use crate::features::links::models::ExpiringLinkToken;
use crate::features::links::repository::TokenRepository;
use crate::features::links::services::LinkService;
use crate::features::links::{protected_routes, public_routes};
use crate::features::media;
use crate::features::plans::builtin::builtin_plans;
use crate::features::plans::models::PlanTier;
use crate::features::plans::repository::PlanRepository;
use crate::features::plans::PlanService;
use crate::modules::media::MediaStore;

pub const TEST_BASE_URL: &str = "http://testserver";

pub fn test_user(sub: &str, roles: &[&str]) -> AuthenticatedUser {
    AuthenticatedUser {
        sub: sub.to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

/// Wrap a router so every request carries the given authenticated user
pub fn with_auth_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                let response: Response = next.run(request).await;
                response
            }
        },
    ))
}

/// A tiny gradient PNG for upload fixtures
pub fn encode_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 8) as u8, (y * 8) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

// =============================================================================
// IN-MEMORY REPOSITORIES
// =============================================================================

#[derive(Default)]
pub struct InMemoryPlanRepository {
    plans: RwLock<HashMap<String, PlanTier>>,
    assignments: RwLock<HashMap<String, String>>,
}

impl InMemoryPlanRepository {
    pub fn with_builtins() -> Self {
        let repo = Self::default();
        let mut plans = HashMap::new();
        for plan in builtin_plans() {
            plans.insert(plan.name.clone(), plan);
        }
        *repo.plans.try_write().unwrap() = plans;
        repo
    }

    pub async fn add_plan(&self, plan: PlanTier) {
        self.plans.write().await.insert(plan.name.clone(), plan);
    }

    pub async fn assign(&self, user_id: &str, plan_name: &str) {
        self.assignments
            .write()
            .await
            .insert(user_id.to_string(), plan_name.to_string());
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<PlanTier>> {
        Ok(self.plans.read().await.get(name).cloned())
    }

    async fn find_assigned(&self, user_id: &str) -> Result<Option<PlanTier>> {
        let assignments = self.assignments.read().await;
        match assignments.get(user_id) {
            Some(plan_name) => Ok(self.plans.read().await.get(plan_name).cloned()),
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct InMemoryImageRepository {
    images: RwLock<HashMap<Uuid, ImageRecord>>,
}

impl InMemoryImageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.images.read().await.is_empty()
    }

    pub async fn all(&self) -> Vec<ImageRecord> {
        let mut images: Vec<ImageRecord> = self.images.read().await.values().cloned().collect();
        images.sort_by_key(|i| i.created_at);
        images
    }
}

#[async_trait]
impl ImageRepository for InMemoryImageRepository {
    async fn insert(&self, image: &ImageRecord) -> Result<()> {
        self.images.write().await.insert(image.id, image.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ImageRecord>> {
        Ok(self.images.read().await.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ImageRecord>> {
        let mut images: Vec<ImageRecord> = self
            .images
            .read()
            .await
            .values()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect();
        images.sort_by_key(|i| i.created_at);
        Ok(images)
    }
}

#[derive(Default)]
pub struct InMemoryTokenRepository {
    tokens: RwLock<HashMap<String, ExpiringLinkToken>>,
    forced_conflicts: RwLock<u32>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    /// Make the next `n` inserts fail with a uniqueness conflict
    pub async fn fail_next_inserts(&self, n: u32) {
        *self.forced_conflicts.write().await = n;
    }

    pub async fn set_expiration(&self, hash: &str, at: DateTime<Utc>) {
        if let Some(token) = self.tokens.write().await.get_mut(hash) {
            token.expiration_date = at;
        }
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn insert(&self, token: &ExpiringLinkToken) -> Result<()> {
        {
            let mut forced = self.forced_conflicts.write().await;
            if *forced > 0 {
                *forced -= 1;
                return Err(AppError::Conflict(format!(
                    "url hash {} already exists",
                    token.url_hash
                )));
            }
        }

        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.url_hash) {
            return Err(AppError::Conflict(format!(
                "url hash {} already exists",
                token.url_hash
            )));
        }
        tokens.insert(token.url_hash.clone(), token.clone());
        Ok(())
    }

    async fn find_live(
        &self,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ExpiringLinkToken>> {
        Ok(self
            .tokens
            .read()
            .await
            .get(hash)
            .filter(|t| t.expiration_date > now)
            .cloned())
    }
}

// =============================================================================
// TEST APP
// =============================================================================

/// Fully wired application over in-memory repositories and a temp-dir media
/// store, for router-level tests.
pub struct TestApp {
    pub plans: Arc<InMemoryPlanRepository>,
    pub images: Arc<InMemoryImageRepository>,
    pub tokens: Arc<InMemoryTokenRepository>,
    pub media: Arc<MediaStore>,
    _media_dir: tempfile::TempDir,
    image_service: Arc<ImageService>,
    plan_service: Arc<PlanService>,
    view_service: Arc<ViewService>,
    link_service: Arc<LinkService>,
}

impl TestApp {
    pub fn new() -> Self {
        let media_dir = tempfile::tempdir().unwrap();
        let plans = Arc::new(InMemoryPlanRepository::with_builtins());
        let images = Arc::new(InMemoryImageRepository::new());
        let tokens = Arc::new(InMemoryTokenRepository::new());
        let media = Arc::new(MediaStore::new(media_dir.path()));

        let image_service = Arc::new(ImageService::new(images.clone(), media.clone()));
        let plan_service = Arc::new(PlanService::new(plans.clone()));
        let view_service = Arc::new(ViewService::new(TEST_BASE_URL));
        let link_service = Arc::new(LinkService::new(
            tokens.clone(),
            media.clone(),
            TEST_BASE_URL,
        ));

        Self {
            plans,
            images,
            tokens,
            media,
            _media_dir: media_dir,
            image_service,
            plan_service,
            view_service,
            link_service,
        }
    }

    fn links_state(&self) -> LinksState {
        LinksState {
            link_service: self.link_service.clone(),
            image_service: self.image_service.clone(),
            plan_service: self.plan_service.clone(),
        }
    }

    /// Router as a given caller sees it: protected routes with the user
    /// injected, public routes merged in
    pub fn router_as(&self, user: AuthenticatedUser) -> Router {
        let protected = Router::new()
            .merge(crate::features::images::routes(
                self.image_service.clone(),
                self.plan_service.clone(),
                self.view_service.clone(),
                1024 * 1024,
            ))
            .merge(protected_routes(self.links_state()));

        with_auth_user(protected, user).merge(self.public_router())
    }

    /// Only the unauthenticated surface (link redemption, media bytes)
    pub fn public_router(&self) -> Router {
        Router::new()
            .merge(public_routes(self.links_state()))
            .merge(media::routes(self.media.clone()))
    }
}
