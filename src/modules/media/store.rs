use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use image::{imageops::FilterType, ImageFormat};
use tokio::fs;

use crate::core::error::{AppError, Result};
use crate::shared::validation::THUMBNAIL_PATH_REGEX;

/// Bytes plus the content type they should be served with
pub struct MediaObject {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Local filesystem store for uploaded originals and cached thumbnails.
///
/// Thumbnails are materialized lazily: a fetch for
/// `user_x/photo.200x0.jpg` that misses on disk resizes `user_x/photo.jpg`
/// with fit semantics, caches the result beside the original, and serves it.
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Internal(format!("failed to create media root: {}", e)))?;
        Ok(())
    }

    /// Resolve a relative media path, rejecting traversal outside the root
    fn resolve(&self, rel: &str) -> Result<PathBuf> {
        let rel_path = Path::new(rel);
        let traversal = rel_path.components().any(|c| {
            !matches!(c, Component::Normal(_))
        });
        if rel.is_empty() || traversal {
            return Err(AppError::BadRequest("invalid media path".to_string()));
        }
        Ok(self.root.join(rel_path))
    }

    pub async fn save(&self, rel: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(rel)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("failed to create media dir: {}", e)))?;
        }
        fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(format!("failed to write media file: {}", e)))?;
        Ok(())
    }

    pub async fn read(&self, rel: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(rel)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Internal(format!(
                "failed to read media file: {}",
                e
            ))),
        }
    }

    /// Fetch a media object, materializing thumbnails on demand
    pub async fn fetch(&self, rel: &str) -> Result<Option<MediaObject>> {
        if let Some(bytes) = self.read(rel).await? {
            return Ok(Some(MediaObject {
                bytes,
                content_type: content_type_for(rel),
            }));
        }

        let caps = match THUMBNAIL_PATH_REGEX.captures(rel) {
            Some(caps) => caps,
            None => return Ok(None),
        };
        let original_rel = format!("{}.{}", &caps["stem"], &caps["ext"]);
        let target_w: u32 = caps["w"].parse().unwrap_or(0);
        let target_h: u32 = caps["h"].parse().unwrap_or(0);

        let original = match self.read(&original_rel).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let format = image_format_for(rel);
        let resized = tokio::task::spawn_blocking(move || {
            resize_to_fit(&original, target_w, target_h, format)
        })
        .await
        .map_err(|e| AppError::Internal(format!("thumbnail task failed: {}", e)))??;

        self.save(rel, &resized).await?;
        tracing::debug!("materialized thumbnail {}", rel);

        Ok(Some(MediaObject {
            bytes: resized,
            content_type: content_type_for(rel),
        }))
    }

    /// Full decoded RGB8 pixel content of a stored image, used for
    /// expiring-link snapshots
    pub async fn decoded_pixels(&self, rel: &str) -> Result<Vec<u8>> {
        let bytes = self
            .read(rel)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("media file {} not found", rel)))?;

        tokio::task::spawn_blocking(move || {
            let img = image::load_from_memory(&bytes)
                .map_err(|e| AppError::Internal(format!("failed to decode image: {}", e)))?;
            Ok(img.to_rgb8().into_raw())
        })
        .await
        .map_err(|e| AppError::Internal(format!("decode task failed: {}", e)))?
    }
}

/// Target dimensions under fit semantics. Zero on an axis means
/// unconstrained; with both axes bounded the image is scaled to fit inside
/// the box, never cropped.
pub fn fit_dimensions(
    orig_w: u32,
    orig_h: u32,
    target_w: u32,
    target_h: u32,
) -> (u32, u32) {
    let scale_w = |h: u32| ((orig_w as f64 * h as f64 / orig_h as f64).round() as u32).max(1);
    let scale_h = |w: u32| ((orig_h as f64 * w as f64 / orig_w as f64).round() as u32).max(1);

    match (target_w, target_h) {
        (0, 0) => (orig_w, orig_h),
        (w, 0) => (w, scale_h(w)),
        (0, h) => (scale_w(h), h),
        (w, h) => {
            let scale = (w as f64 / orig_w as f64).min(h as f64 / orig_h as f64);
            (
                ((orig_w as f64 * scale).round() as u32).max(1),
                ((orig_h as f64 * scale).round() as u32).max(1),
            )
        }
    }
}

fn resize_to_fit(
    original: &[u8],
    target_w: u32,
    target_h: u32,
    format: ImageFormat,
) -> Result<Vec<u8>> {
    let img = image::load_from_memory(original)
        .map_err(|e| AppError::Internal(format!("failed to decode image: {}", e)))?;

    let (tw, th) = fit_dimensions(img.width(), img.height(), target_w, target_h);
    let resized = img.resize_exact(tw, th, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, format)
        .map_err(|e| AppError::Internal(format!("failed to encode thumbnail: {}", e)))?;
    Ok(out.into_inner())
}

fn content_type_for(rel: &str) -> &'static str {
    let lower = rel.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}

fn image_format_for(rel: &str) -> ImageFormat {
    if rel.to_ascii_lowercase().ends_with(".png") {
        ImageFormat::Png
    } else {
        ImageFormat::Jpeg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::encode_test_png;

    #[test]
    fn fit_both_zero_keeps_original() {
        assert_eq!(fit_dimensions(640, 480, 0, 0), (640, 480));
    }

    #[test]
    fn fit_zero_width_scales_by_height() {
        assert_eq!(fit_dimensions(640, 480, 0, 240), (320, 240));
        assert_eq!(fit_dimensions(100, 400, 0, 200), (50, 200));
    }

    #[test]
    fn fit_zero_height_scales_by_width() {
        assert_eq!(fit_dimensions(640, 480, 320, 0), (320, 240));
    }

    #[test]
    fn fit_box_never_crops() {
        // 2:1 image into a square box: width governs
        assert_eq!(fit_dimensions(800, 400, 200, 200), (200, 100));
        // 1:2 image into a square box: height governs
        assert_eq!(fit_dimensions(400, 800, 200, 200), (100, 200));
    }

    #[test]
    fn fit_never_collapses_to_zero() {
        assert_eq!(fit_dimensions(1000, 1, 10, 0), (10, 1));
    }

    #[tokio::test]
    async fn save_then_fetch_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let png = encode_test_png(8, 4);

        store.save("user_a/pic.png", &png).await.unwrap();
        let obj = store.fetch("user_a/pic.png").await.unwrap().unwrap();

        assert_eq!(obj.bytes, png);
        assert_eq!(obj.content_type, "image/png");
    }

    #[tokio::test]
    async fn fetch_materializes_thumbnail_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        store
            .save("user_a/pic.png", &encode_test_png(8, 4))
            .await
            .unwrap();

        let obj = store.fetch("user_a/pic.4x0.png").await.unwrap().unwrap();
        let thumb = image::load_from_memory(&obj.bytes).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (4, 2));

        // Cached on disk after the first fetch
        assert!(store.read("user_a/pic.4x0.png").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn fetch_unknown_path_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        assert!(store.fetch("user_a/missing.png").await.unwrap().is_none());
        assert!(store.fetch("user_a/missing.50x0.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn traversal_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        assert!(store.read("../escape.png").await.is_err());
        assert!(store.read("user_a/../../escape.png").await.is_err());
    }

    #[tokio::test]
    async fn decoded_pixels_returns_rgb8_payload() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        store
            .save("user_a/pic.png", &encode_test_png(4, 4))
            .await
            .unwrap();

        let pixels = store.decoded_pixels("user_a/pic.png").await.unwrap();
        assert_eq!(pixels.len(), 4 * 4 * 3);
    }
}
