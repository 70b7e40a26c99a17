pub mod auth;
pub mod images;
pub mod links;
pub mod media;
pub mod plans;
