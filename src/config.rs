use std::net::IpAddr;
use std::time::Duration;

use crate::gate::{GateSettings, ReturnTo};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub gate: GateSettings,
    /// Mount points served behind the gate, e.g. `/app`.
    pub protected_mounts: Vec<String>,
    pub secure_cookies: bool,
    /// Sessions unused for this long are dropped.
    pub session_idle: Duration,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("ENSURE_LOGIN_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid ENSURE_LOGIN_HOST: {e}"))?;

        let port: u16 = env_or("ENSURE_LOGIN_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid ENSURE_LOGIN_PORT: {e}"))?;

        let mut gate = GateSettings::new();
        if let Ok(target) = std::env::var("ENSURE_LOGIN_REDIRECT_TO") {
            gate = gate.redirect_to(target);
        }
        if let Ok(mount) = std::env::var("ENSURE_LOGIN_BASE_URL") {
            gate = gate.base_url(mount);
        }
        if let Ok(policy) = std::env::var("ENSURE_LOGIN_SET_RETURN_TO") {
            let policy: ReturnTo = policy
                .parse()
                .map_err(|e| format!("Invalid ENSURE_LOGIN_SET_RETURN_TO: {e}"))?;
            gate = gate.set_return_to(policy);
        }
        let set_return_when_xhr: bool = env_or("ENSURE_LOGIN_SET_RETURN_WHEN_XHR", "false")
            .parse()
            .map_err(|e| format!("Invalid ENSURE_LOGIN_SET_RETURN_WHEN_XHR: {e}"))?;
        gate = gate.set_return_when_xhr(set_return_when_xhr);

        let protected_mounts: Vec<String> = env_or("ENSURE_LOGIN_PROTECTED", "/app")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_mount(s.trim()))
            .collect::<Result<Vec<_>, _>>()?;

        let secure_cookies: bool = env_or("ENSURE_LOGIN_SECURE_COOKIES", "true")
            .parse()
            .map_err(|e| format!("Invalid ENSURE_LOGIN_SECURE_COOKIES: {e}"))?;

        let session_idle_secs: u64 = env_or("ENSURE_LOGIN_SESSION_IDLE_SECS", "3600")
            .parse()
            .map_err(|e| format!("Invalid ENSURE_LOGIN_SESSION_IDLE_SECS: {e}"))?;
        let session_idle = Duration::from_secs(session_idle_secs);

        let log_level = env_or("ENSURE_LOGIN_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            gate,
            protected_mounts,
            secure_cookies,
            session_idle,
            log_level,
        })
    }
}

/// Protected mounts are nested routers, so they need a leading slash and
/// cannot be the root.
pub fn parse_mount(mount: &str) -> Result<String, String> {
    let trimmed = mount.trim_end_matches('/');
    if !trimmed.starts_with('/') {
        return Err(format!(
            "Invalid ENSURE_LOGIN_PROTECTED entry '{mount}': \
             must start with '/' and not be the root"
        ));
    }
    Ok(trimmed.to_string())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
