pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

pub use repository::{PgTokenRepository, TokenRepository};
pub use routes::{protected_routes, public_routes};
pub use services::LinkService;
