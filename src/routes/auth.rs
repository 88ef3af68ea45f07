use axum::response::{Html, Redirect};
use axum::Form;
use serde::Deserialize;

use crate::error::AppError;
use crate::gate::RETURN_TO_KEY;
use crate::session::{Session, USER_KEY};

#[derive(Deserialize)]
pub struct SignInRequest {
    pub username: String,
}

pub async fn sign_in_page() -> Html<&'static str> {
    Html(
        r#"<!doctype html>
<html>
  <body>
    <form method="post">
      <label>Username <input name="username" autofocus></label>
      <button type="submit">Sign in</button>
    </form>
  </body>
</html>
"#,
    )
}

/// Sign the session in and resume wherever the gate interrupted it.
pub async fn sign_in(
    session: Session,
    Form(req): Form<SignInRequest>,
) -> Result<Redirect, AppError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("Username is required".to_string()));
    }

    let target = session
        .remove(RETURN_TO_KEY)
        .filter(|path| is_local_path(path))
        .unwrap_or_else(|| "/".to_string());

    // A session id handed out before sign-in must not become authenticated.
    session.cycle_id();
    session.insert(USER_KEY, username)?;

    tracing::info!(user = %username, return_to = %target, "User signed in");
    Ok(Redirect::to(&target))
}

pub async fn sign_out(session: Session) -> Redirect {
    if let Some(user) = session.remove(USER_KEY) {
        tracing::info!(user = %user, "User signed out");
    }
    session.destroy();
    Redirect::to("/")
}

/// Only same-origin paths are followed; `//host/...` would leave the site.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}
