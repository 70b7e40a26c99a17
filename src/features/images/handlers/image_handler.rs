use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::images::dtos::UploadImageDto;
use crate::features::images::services::{ImageService, ViewService};
use crate::features::plans::PlanService;

#[derive(Clone)]
pub struct ImagesState {
    pub image_service: Arc<ImageService>,
    pub plan_service: Arc<PlanService>,
    pub view_service: Arc<ViewService>,
}

/// Upload an image
///
/// Accepts multipart/form-data with:
/// - `image_file`: JPEG or PNG file (required)
/// - `name`: optional display name (defaults to the truncated filename)
///
/// The response is the materialized view for the caller's plan.
#[utoipa::path(
    post,
    path = "/images/upload",
    tag = "images",
    request_body(
        content = UploadImageDto,
        content_type = "multipart/form-data",
        description = "Image upload form",
    ),
    responses(
        (status = 201, description = "Image uploaded; body is the plan-gated view"),
        (status = 400, description = "Missing file or disallowed extension"),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Caller has no plan assignment")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_image(
    user: AuthenticatedUser,
    State(state): State<ImagesState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    // Resolve the plan up front: an unassigned user cannot view any image
    // data, so nothing should be written for them either
    let plan = state.plan_service.resolve(&user).await?;

    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "image_file" => {
                let fname = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                file_data = Some(data.to_vec());
                file_name = Some(fname);
            }
            "name" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read name field: {}", e))
                })?;
                if !text.is_empty() {
                    name = Some(text);
                }
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let file_data =
        file_data.ok_or_else(|| AppError::Validation("image_file is required".to_string()))?;
    let file_name =
        file_name.ok_or_else(|| AppError::Validation("image_file is required".to_string()))?;

    let record = state
        .image_service
        .upload(&user, &file_name, name, file_data)
        .await?;

    let view = state.view_service.render(&record, &plan);
    Ok((StatusCode::CREATED, Json(Value::Object(view))))
}

/// List the caller's images
///
/// Each entry is rendered through the caller's plan.
#[utoipa::path(
    get,
    path = "/images/",
    tag = "images",
    responses(
        (status = 200, description = "Caller's images, plan-gated"),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Caller has no plan assignment")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_images(
    user: AuthenticatedUser,
    State(state): State<ImagesState>,
) -> Result<Json<Value>, AppError> {
    let plan = state.plan_service.resolve(&user).await?;
    let images = state.image_service.list_owned(&user.sub).await?;

    let views: Vec<Value> = images
        .iter()
        .map(|image| Value::Object(state.view_service.render(image, &plan)))
        .collect();

    Ok(Json(Value::Array(views)))
}

/// Get a single image
///
/// Owner or admin only; a foreign image reads as 404.
#[utoipa::path(
    get,
    path = "/{id}/",
    tag = "images",
    params(("id" = Uuid, Path, description = "Image id")),
    responses(
        (status = 200, description = "Plan-gated view of the image"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Unknown or foreign image"),
        (status = 409, description = "Caller has no plan assignment")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_image(
    user: AuthenticatedUser,
    State(state): State<ImagesState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let plan = state.plan_service.resolve(&user).await?;
    let image = state.image_service.get_for_user(id, &user).await?;

    Ok(Json(Value::Object(state.view_service.render(&image, &plan))))
}
