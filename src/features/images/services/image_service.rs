use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::images::dtos::{cut_image_name, sanitize_filename};
use crate::features::images::models::ImageRecord;
use crate::features::images::repository::ImageRepository;
use crate::modules::media::MediaStore;
use crate::shared::validation::{has_allowed_extension, EXTENSION_MESSAGE};

/// Upload, lookup and listing of image records. Validation happens before
/// the media store or the repository see a write.
pub struct ImageService {
    images: Arc<dyn ImageRepository>,
    media: Arc<MediaStore>,
}

impl ImageService {
    pub fn new(images: Arc<dyn ImageRepository>, media: Arc<MediaStore>) -> Self {
        Self { images, media }
    }

    pub async fn upload(
        &self,
        owner: &AuthenticatedUser,
        filename: &str,
        name: Option<String>,
        data: Vec<u8>,
    ) -> Result<ImageRecord> {
        let filename = sanitize_filename(filename);
        if !has_allowed_extension(&filename) {
            return Err(AppError::Validation(EXTENSION_MESSAGE.to_string()));
        }
        if data.is_empty() {
            return Err(AppError::Validation("image_file is required".to_string()));
        }

        let name = match name.filter(|n| !n.is_empty()) {
            Some(name) => cut_image_name(&name),
            None => cut_image_name(&filename),
        };

        // MEDIA_ROOT/user_<owner>/<filename>, for link readability
        let file_path = format!("user_{}/{}", owner.sub, filename);
        self.media.save(&file_path, &data).await?;

        let record = ImageRecord::new(owner.sub.clone(), name, file_path);
        self.images.insert(&record).await?;

        info!(
            "image uploaded: id={}, owner={}, path={}",
            record.id, record.owner_id, record.file_path
        );

        Ok(record)
    }

    pub async fn list_owned(&self, owner_id: &str) -> Result<Vec<ImageRecord>> {
        self.images.list_by_owner(owner_id).await
    }

    /// Fetch an image with no ownership check. Callers that must report
    /// foreign images as forbidden rather than missing (link issuance) use
    /// this and check ownership themselves.
    pub async fn find(&self, id: Uuid) -> Result<ImageRecord> {
        self.images
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("image {} not found", id)))
    }

    /// Fetch a single image for a caller. A foreign image is reported as
    /// missing rather than forbidden, so existence does not leak.
    pub async fn get_for_user(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<ImageRecord> {
        let image = self
            .images
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("image {} not found", id)))?;

        if !user.can_access_owned_by(&image.owner_id) {
            return Err(AppError::NotFound(format!("image {} not found", id)));
        }

        Ok(image)
    }
}
