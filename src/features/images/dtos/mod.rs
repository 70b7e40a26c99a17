mod image_dto;

pub use image_dto::{cut_image_name, sanitize_filename, UploadImageDto};
