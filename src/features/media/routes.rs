use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::media::handlers::serve_media;
use crate::modules::media::MediaStore;

/// Public media serving (originals and lazily materialized thumbnails)
pub fn routes(media: Arc<MediaStore>) -> Router {
    Router::new()
        .route("/media/{*path}", get(serve_media))
        .with_state(media)
}
