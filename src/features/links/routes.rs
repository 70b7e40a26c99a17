use axum::{
    routing::{get, post},
    Router,
};

use crate::features::links::handlers::{create_expiring_link, redeem_expiring_link, LinksState};

/// Routes that require the auth middleware to be applied by the caller
pub fn protected_routes(state: LinksState) -> Router {
    Router::new()
        .route("/make_temp/{id}/", post(create_expiring_link))
        .with_state(state)
}

/// Redemption is deliberately unauthenticated: the hash is the credential
pub fn public_routes(state: LinksState) -> Router {
    Router::new()
        .route("/temp/{hash}/", get(redeem_expiring_link))
        .with_state(state)
}
