use axum::extract::OriginalUri;
use axum::Extension;

use crate::session::CurrentUser;

/// Placeholder for whatever the application serves behind the gate.
pub async fn show(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    OriginalUri(uri): OriginalUri,
) -> String {
    format!("Hello {user}, you reached {}", uri.path())
}
