pub mod auth;
pub mod protected;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::gate::EnsureLoggedIn;
use crate::middleware::ensure_logged_in::ensure_logged_in;
use crate::state::SharedState;

pub fn auth_routes(sign_in_path: &str) -> Router<SharedState> {
    Router::new()
        .route(sign_in_path, get(auth::sign_in_page).post(auth::sign_in))
        .route("/logout", post(auth::sign_out))
}

/// The protected area, to be nested under a mount point.
pub fn protected_routes(gate: Arc<EnsureLoggedIn>) -> Router<SharedState> {
    Router::new()
        .route("/", get(protected::show))
        .route("/{*rest}", get(protected::show))
        .layer(axum::middleware::from_fn_with_state(gate, ensure_logged_in))
}
