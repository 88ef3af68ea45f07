use axum::http::HeaderValue;
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::gate::location::absolute_target;
use crate::gate::return_to::{ReturnPathMatcher, ReturnTo};

pub const DEFAULT_REDIRECT_TO: &str = "/login";

/// The accepted ways of describing a gate.
#[derive(Debug, Clone, Default)]
pub enum GateOptions {
    /// Redirect to `/login` and always remember.
    #[default]
    Default,
    /// Redirect to the given target and always remember.
    RedirectTo(String),
    Settings(GateSettings),
}

/// Settings record. Unset fields fall back to their defaults.
#[derive(Debug, Clone, Default)]
pub struct GateSettings {
    pub redirect_to: Option<String>,
    pub base_url: Option<String>,
    /// Defaults to [`ReturnPathMatcher::skip_resources`].
    pub set_return_to: Option<ReturnTo>,
    pub set_return_when_xhr: bool,
}

impl GateSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.redirect_to = Some(target.into());
        self
    }

    pub fn base_url(mut self, mount: impl Into<String>) -> Self {
        self.base_url = Some(mount.into());
        self
    }

    pub fn set_return_to(mut self, policy: impl Into<ReturnTo>) -> Self {
        self.set_return_to = Some(policy.into());
        self
    }

    pub fn set_return_when_xhr(mut self, enabled: bool) -> Self {
        self.set_return_when_xhr = enabled;
        self
    }
}

impl From<()> for GateOptions {
    fn from(_: ()) -> Self {
        GateOptions::Default
    }
}

impl From<&str> for GateOptions {
    fn from(target: &str) -> Self {
        GateOptions::RedirectTo(target.to_string())
    }
}

impl From<String> for GateOptions {
    fn from(target: String) -> Self {
        GateOptions::RedirectTo(target)
    }
}

impl From<GateSettings> for GateOptions {
    fn from(settings: GateSettings) -> Self {
        GateOptions::Settings(settings)
    }
}

/// Loosely typed options: `null`, a string, or an object using the
/// `redirectTo` / `baseUrl` / `setReturnTo` / `setReturnWhenXhr` keys.
impl TryFrom<Value> for GateOptions {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(GateOptions::Default),
            Value::String(target) => Ok(GateOptions::RedirectTo(target)),
            Value::Object(map) => Ok(GateOptions::Settings(settings_from_object(map)?)),
            Value::Bool(_) => Err(ConfigError::UnrecognizedShape("a boolean".to_string())),
            Value::Number(_) => Err(ConfigError::UnrecognizedShape("a number".to_string())),
            Value::Array(_) => Err(ConfigError::UnrecognizedShape("an array".to_string())),
        }
    }
}

fn settings_from_object(map: Map<String, Value>) -> Result<GateSettings, ConfigError> {
    let mut settings = GateSettings::new();

    for (key, value) in map {
        match key.as_str() {
            "redirectTo" => settings.redirect_to = optional_string(&key, value)?,
            "baseUrl" => settings.base_url = optional_string(&key, value)?,
            "setReturnTo" => {
                settings.set_return_to = match value {
                    Value::Null => None,
                    Value::Bool(enabled) => Some(enabled.into()),
                    Value::String(pattern) => Some(ReturnPathMatcher::pattern(&pattern)?.into()),
                    _ => return Err(invalid(&key, "expected a boolean or a pattern string")),
                }
            }
            "setReturnWhenXhr" => {
                settings.set_return_when_xhr = match value {
                    Value::Null => false,
                    Value::Bool(enabled) => enabled,
                    _ => return Err(invalid(&key, "expected a boolean")),
                }
            }
            _ => return Err(ConfigError::UnknownField(key)),
        }
    }

    Ok(settings)
}

fn optional_string(key: &str, value: Value) -> Result<Option<String>, ConfigError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        _ => Err(invalid(key, "expected a string")),
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Canonical, validated gate configuration.
#[derive(Debug, Clone)]
pub struct GateConfig {
    redirect_to: String,
    base_url: Option<String>,
    set_return_to: ReturnTo,
    set_return_when_xhr: bool,
}

impl GateConfig {
    pub fn from_options(options: GateOptions) -> Result<Self, ConfigError> {
        let config = match options {
            GateOptions::Default => GateConfig::default(),
            GateOptions::RedirectTo(target) => GateConfig {
                redirect_to: target,
                ..GateConfig::default()
            },
            GateOptions::Settings(settings) => GateConfig {
                redirect_to: settings
                    .redirect_to
                    .unwrap_or_else(|| DEFAULT_REDIRECT_TO.to_string()),
                base_url: settings.base_url.filter(|mount| !mount.is_empty()),
                set_return_to: settings
                    .set_return_to
                    .unwrap_or_else(|| ReturnPathMatcher::skip_resources().into()),
                set_return_when_xhr: settings.set_return_when_xhr,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.redirect_to.trim().is_empty() {
            return Err(ConfigError::InvalidRedirectTarget(self.redirect_to.clone()));
        }

        let location = absolute_target(&self.redirect_to, self.base_url.as_deref());
        HeaderValue::from_str(&location)
            .map_err(|_| ConfigError::InvalidRedirectTarget(self.redirect_to.clone()))?;

        Ok(())
    }

    pub fn redirect_to(&self) -> &str {
        &self.redirect_to
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn set_return_to(&self) -> &ReturnTo {
        &self.set_return_to
    }

    pub fn set_return_when_xhr(&self) -> bool {
        self.set_return_when_xhr
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            redirect_to: DEFAULT_REDIRECT_TO.to_string(),
            base_url: None,
            set_return_to: ReturnTo::Always,
            set_return_when_xhr: false,
        }
    }
}
