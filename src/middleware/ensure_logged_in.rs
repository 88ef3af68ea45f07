use std::sync::Arc;

use axum::extract::{OriginalUri, Request, State};
use axum::http::{HeaderMap, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::error::AppError;
use crate::gate::{Decision, EnsureLoggedIn, GateRequest, GateResponse};
use crate::session::{CurrentUser, Session};

/// Middleware that only lets signed-in users through. Anonymous requests are
/// redirected according to the gate's configuration.
///
/// Install with `axum::middleware::from_fn_with_state(gate, ensure_logged_in)`
/// below the session layer.
pub async fn ensure_logged_in(
    State(gate): State<Arc<EnsureLoggedIn>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let mut gate_req = HttpGateRequest::new(&req);
    let mut gate_res = RedirectResponse::default();

    match gate.check(&mut gate_req, &mut gate_res)? {
        Decision::Continue => Ok(next.run(req).await),
        Decision::Redirect { .. } => gate_res
            .response
            .ok_or_else(|| AppError::Internal("Gate redirected without a response".to_string())),
    }
}

/// Owned snapshot of what the gate reads from an axum request.
struct HttpGateRequest {
    url: String,
    original_url: Option<String>,
    client_hint: bool,
    authenticated: Option<bool>,
    session: Option<Session>,
}

impl HttpGateRequest {
    fn new(req: &Request) -> Self {
        let extensions = req.extensions();
        Self {
            url: path_and_query(req.uri()),
            original_url: extensions
                .get::<OriginalUri>()
                .map(|OriginalUri(uri)| path_and_query(uri)),
            client_hint: is_xhr(req.headers()),
            authenticated: extensions.get::<CurrentUser>().map(|_| true),
            session: extensions.get::<Session>().cloned(),
        }
    }
}

impl GateRequest for HttpGateRequest {
    type Error = AppError;

    fn url(&self) -> &str {
        &self.url
    }

    fn original_url(&self) -> Option<&str> {
        self.original_url.as_deref()
    }

    fn is_client_hint(&self) -> bool {
        self.client_hint
    }

    fn is_authenticated(&self) -> Option<bool> {
        self.authenticated
    }

    fn remember(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| AppError::Internal("Session layer is not installed".to_string()))?;
        session.insert(key, value)
    }
}

#[derive(Default)]
struct RedirectResponse {
    response: Option<Response>,
}

impl GateResponse for RedirectResponse {
    type Error = AppError;

    fn redirect(&mut self, location: &str) -> Result<(), AppError> {
        self.response = Some(Redirect::to(location).into_response());
        Ok(())
    }
}

fn path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// `X-Requested-With: XMLHttpRequest`, as sent by script-driven clients.
fn is_xhr(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}
