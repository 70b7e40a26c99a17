mod image_service;
mod view_service;

pub use image_service::ImageService;
pub use view_service::ViewService;
