mod validator;

pub mod model;

pub use validator::JwtValidator;
