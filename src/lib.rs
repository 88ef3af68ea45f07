pub mod config;
pub mod error;
pub mod gate;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::ConfigError;
use crate::gate::{absolute_target, EnsureLoggedIn};
use crate::session::{load_session, SessionStore};
use crate::state::{AppState, SharedState};

pub fn build_app(config: Config) -> Result<(Router, SharedState), ConfigError> {
    let gate = Arc::new(EnsureLoggedIn::new(config.gate.clone())?);

    let sign_in_path = absolute_target(gate.config().redirect_to(), gate.config().base_url());
    let sign_in_path = sign_in_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_string();

    let state: SharedState = Arc::new(AppState {
        config,
        gate,
        sessions: Arc::new(SessionStore::new()),
    });

    let mut app = Router::new().route("/health", axum::routing::get(health));

    // Off-site targets have nothing to serve locally.
    if sign_in_path.starts_with('/') {
        app = app.merge(routes::auth_routes(&sign_in_path));
    } else {
        tracing::warn!(
            path = %sign_in_path,
            "Sign-in target is not a local path, not serving a sign-in page"
        );
        app = app.route("/logout", axum::routing::post(routes::auth::sign_out));
    }

    for mount in &state.config.protected_mounts {
        let mount = crate::config::parse_mount(mount).map_err(ConfigError::InvalidMount)?;
        app = app.nest(&mount, routes::protected_routes(state.gate.clone()));
    }

    let app = app
        .layer(axum::middleware::from_fn_with_state(state.clone(), load_session))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state.clone());

    Ok((app, state))
}

async fn health() -> &'static str {
    "ok"
}
