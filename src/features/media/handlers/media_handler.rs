use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::core::error::AppError;
use crate::modules::media::MediaStore;

/// Serve an original or thumbnail from the media store
///
/// A path carrying a `{width}x{height}` suffix that misses on disk is
/// materialized from the original on first access and cached.
#[utoipa::path(
    get,
    path = "/media/{path}",
    tag = "media",
    params(("path" = String, Path, description = "Media path, e.g. user_x/pic.jpg or user_x/pic.200x0.jpg")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Unknown media path")
    )
)]
pub async fn serve_media(
    State(media): State<Arc<MediaStore>>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let object = media
        .fetch(&path)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("media {} not found", path)))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, object.content_type)],
        object.bytes,
    )
        .into_response())
}
