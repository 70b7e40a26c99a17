pub mod builtin;
pub mod models;
pub mod repository;
pub mod services;

pub use repository::{PgPlanRepository, PlanRepository};
pub use services::PlanService;
