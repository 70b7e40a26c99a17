pub mod link_handler;

pub use link_handler::{create_expiring_link, redeem_expiring_link, LinksState};
