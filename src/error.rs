use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors raised while building a gate from its options.
///
/// These only ever surface at setup time; a gate that was built successfully
/// never produces one.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The options were neither empty, a string, nor a settings record.
    UnrecognizedShape(String),
    /// A settings record carried a field the gate does not understand.
    UnknownField(String),
    /// A recognized field had the wrong type.
    InvalidField { field: String, reason: String },
    /// `setReturnTo` was a pattern that failed to compile.
    InvalidPattern(String),
    /// The redirect target can never be sent as a `Location` header.
    InvalidRedirectTarget(String),
    /// A protected mount point the router cannot nest under.
    InvalidMount(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnrecognizedShape(kind) => {
                write!(
                    f,
                    "Unrecognized gate options: expected nothing, a string or an object, got {kind}"
                )
            }
            ConfigError::UnknownField(name) => write!(f, "Unknown gate option: {name}"),
            ConfigError::InvalidField { field, reason } => {
                write!(f, "Invalid gate option {field}: {reason}")
            }
            ConfigError::InvalidPattern(msg) => write!(f, "Invalid setReturnTo pattern: {msg}"),
            ConfigError::InvalidRedirectTarget(target) => {
                write!(f, "Invalid redirect target: {target:?}")
            }
            ConfigError::InvalidMount(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

