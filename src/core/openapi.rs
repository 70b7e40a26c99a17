use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::images::{dtos as images_dtos, handlers as images_handlers};
use crate::features::links::{dtos as links_dtos, handlers as links_handlers};
use crate::features::media::handlers as media_handlers;
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Images
        images_handlers::image_handler::upload_image,
        images_handlers::image_handler::list_images,
        images_handlers::image_handler::get_image,
        // Expiring links
        links_handlers::link_handler::create_expiring_link,
        links_handlers::link_handler::redeem_expiring_link,
        // Media
        media_handlers::media_handler::serve_media,
    ),
    components(
        schemas(
            auth::model::AuthenticatedUser,
            images_dtos::UploadImageDto,
            links_dtos::CreateExpiringLinkDto,
            links_dtos::ExpiringLinkResponseDto,
            ApiResponse<links_dtos::ExpiringLinkResponseDto>,
        )
    ),
    tags(
        (name = "images", description = "Image upload and plan-gated views"),
        (name = "links", description = "Expiring links to image snapshots"),
        (name = "media", description = "Original and thumbnail bytes"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
