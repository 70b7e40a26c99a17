use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::images::services::ImageService;
use crate::features::links::dtos::{CreateExpiringLinkDto, ExpiringLinkResponseDto};
use crate::features::links::services::LinkService;
use crate::features::plans::PlanService;
use crate::shared::validation::first_validation_message;

#[derive(Clone)]
pub struct LinksState {
    pub link_service: Arc<LinkService>,
    pub image_service: Arc<ImageService>,
    pub plan_service: Arc<PlanService>,
}

/// Issue an expiring link for an image
///
/// Owner or admin only, and the caller's plan must carry the
/// create_expiring_link capability.
#[utoipa::path(
    post,
    path = "/make_temp/{id}/",
    tag = "links",
    params(("id" = Uuid, Path, description = "Image id")),
    request_body = CreateExpiringLinkDto,
    responses(
        (status = 201, description = "Link issued", body = ExpiringLinkResponseDto),
        (status = 400, description = "expires_seconds out of range"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner, or plan lacks the capability"),
        (status = 404, description = "Unknown image"),
        (status = 409, description = "Caller has no plan assignment")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_expiring_link(
    user: AuthenticatedUser,
    State(state): State<LinksState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<CreateExpiringLinkDto>,
) -> Result<(StatusCode, Json<ExpiringLinkResponseDto>), AppError> {
    let image = state.image_service.find(id).await?;

    // Permission checks come before body validation, matching the order a
    // caller observes: a non-owner gets 403 whatever the ttl says
    if !user.can_access_owned_by(&image.owner_id) {
        return Err(AppError::Forbidden(
            "Only the image owner can create expiring links".to_string(),
        ));
    }

    let plan = state.plan_service.resolve(&user).await?;
    if !plan.create_expiring_link {
        return Err(AppError::Forbidden(
            "Your plan does not allow creating expiring links".to_string(),
        ));
    }

    dto.validate()
        .map_err(|e| AppError::Validation(first_validation_message(&e)))?;

    let token = state.link_service.issue(&image, dto.expires_seconds).await?;

    let response = ExpiringLinkResponseDto {
        expiring_link_url: state.link_service.expiring_link_url(&token.url_hash),
        url_hash: token.url_hash,
        expiration_date: token.expiration_date,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Redeem an expiring link
///
/// Unauthenticated. Returns the snapshot bytes while the token is live;
/// expired and unknown hashes are both 404.
#[utoipa::path(
    get,
    path = "/temp/{hash}/",
    tag = "links",
    params(("hash" = String, Path, description = "Link hash")),
    responses(
        (status = 200, description = "Snapshot bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown or expired link")
    )
)]
pub async fn redeem_expiring_link(
    State(state): State<LinksState>,
    Path(hash): Path<String>,
) -> Result<Response, AppError> {
    let bytes = state.link_service.redeem(&hash).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    )
        .into_response())
}
