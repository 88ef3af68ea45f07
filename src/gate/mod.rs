//! The access gate: let authenticated requests through, send everyone else
//! to the sign-in page, optionally remembering where they were headed.

pub mod location;
pub mod options;
pub mod return_to;

pub use location::{absolute_target, compute_redirect_location};
pub use options::{GateConfig, GateOptions, GateSettings, DEFAULT_REDIRECT_TO};
pub use return_to::{ReturnPathMatcher, ReturnTo, SKIP_RESOURCES_PATTERN};

use crate::error::ConfigError;

/// Session key the original path is stored under.
pub const RETURN_TO_KEY: &str = "returnTo";

/// What the gate needs from an incoming request.
pub trait GateRequest {
    type Error;

    /// Routed path, possibly with the mount prefix stripped.
    fn url(&self) -> &str;

    /// Full path before any mount rewriting, when the host tracks it.
    fn original_url(&self) -> Option<&str> {
        None
    }

    /// Script-driven (AJAX) request.
    fn is_client_hint(&self) -> bool {
        false
    }

    /// `None` when the host offers no authentication check at all.
    fn is_authenticated(&self) -> Option<bool> {
        None
    }

    /// Store `value` in the session under `key`, replacing any prior value.
    fn remember(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;
}

/// What the gate needs from the outgoing response.
pub trait GateResponse {
    type Error;

    fn redirect(&mut self, location: &str) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Redirect {
        location: String,
        /// The path written to the session, if any.
        remembered: Option<String>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct EnsureLoggedIn {
    config: GateConfig,
}

impl EnsureLoggedIn {
    pub fn new(options: impl Into<GateOptions>) -> Result<Self, ConfigError> {
        let config = GateConfig::from_options(options.into())?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decide on a single request, performing the session write and the
    /// redirect when the requester is anonymous.
    ///
    /// Errors from either collaborator are returned unchanged.
    pub fn check<Q, S>(&self, req: &mut Q, res: &mut S) -> Result<Decision, Q::Error>
    where
        Q: GateRequest,
        S: GateResponse<Error = Q::Error>,
    {
        if req.is_authenticated().unwrap_or(false) {
            return Ok(Decision::Continue);
        }

        let return_path = req.original_url().unwrap_or(req.url()).to_string();
        let location = compute_redirect_location(
            self.config.redirect_to(),
            &return_path,
            self.config.base_url(),
        );

        let remembered = if self.should_remember(&return_path, req.is_client_hint()) {
            req.remember(RETURN_TO_KEY, &return_path)?;
            Some(return_path)
        } else {
            None
        };

        res.redirect(&location)?;

        tracing::debug!(
            location = %location,
            remembered = ?remembered,
            "Redirecting unauthenticated request"
        );

        Ok(Decision::Redirect {
            location,
            remembered,
        })
    }

    /// Middleware shape: run `next` for authenticated requests, otherwise
    /// redirect and return `None`.
    pub fn handle<Q, S, N, T>(
        &self,
        req: &mut Q,
        res: &mut S,
        next: N,
    ) -> Result<Option<T>, Q::Error>
    where
        Q: GateRequest,
        S: GateResponse<Error = Q::Error>,
        N: FnOnce(&mut Q) -> T,
    {
        match self.check(req, res)? {
            Decision::Continue => Ok(Some(next(req))),
            Decision::Redirect { .. } => Ok(None),
        }
    }

    fn should_remember(&self, return_path: &str, client_hint: bool) -> bool {
        if client_hint && !self.config.set_return_when_xhr() {
            return false;
        }
        self.config.set_return_to().allows(return_path)
    }
}
