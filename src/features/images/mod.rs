pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

pub use repository::{ImageRepository, PgImageRepository};
pub use routes::routes;
pub use services::{ImageService, ViewService};
