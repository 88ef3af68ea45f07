use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::ConfigError;

/// Matches paths whose last segment carries no `.`, i.e. pages rather than
/// static resources such as `/app/foo.png`.
pub const SKIP_RESOURCES_PATTERN: &str = r"^([^/]*|.*/)[^.]+$";

static SKIP_RESOURCES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SKIP_RESOURCES_PATTERN).unwrap());

/// Predicate deciding whether a return path is worth remembering.
#[derive(Clone)]
pub struct ReturnPathMatcher {
    predicate: Arc<dyn Fn(&str) -> bool + Send + Sync>,
    description: String,
}

impl ReturnPathMatcher {
    /// Wrap an arbitrary predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            description: "custom predicate".to_string(),
        }
    }

    /// Compile `pattern` as a regular expression tested against the path.
    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        let re = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
        Ok(Self::from_regex(re))
    }

    pub fn from_regex(re: Regex) -> Self {
        let description = format!("/{}/", re.as_str());
        Self {
            predicate: Arc::new(move |path| re.is_match(path)),
            description,
        }
    }

    /// The default for settings records: remember pages, skip resources.
    pub fn skip_resources() -> Self {
        Self {
            predicate: Arc::new(|path| SKIP_RESOURCES_RE.is_match(path)),
            description: format!("/{SKIP_RESOURCES_PATTERN}/"),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        (self.predicate)(path)
    }
}

impl std::fmt::Debug for ReturnPathMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReturnPathMatcher").field(&self.description).finish()
    }
}

/// When the original path is written to the session before redirecting.
#[derive(Debug, Clone, Default)]
pub enum ReturnTo {
    #[default]
    Always,
    Never,
    Matching(ReturnPathMatcher),
}

impl ReturnTo {
    pub fn allows(&self, path: &str) -> bool {
        match self {
            ReturnTo::Always => true,
            ReturnTo::Never => false,
            ReturnTo::Matching(matcher) => matcher.matches(path),
        }
    }
}

/// `true` and `false` toggle remembering; anything else is a pattern.
impl FromStr for ReturnTo {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "true" => Ok(ReturnTo::Always),
            "false" => Ok(ReturnTo::Never),
            pattern => Ok(ReturnTo::Matching(ReturnPathMatcher::pattern(pattern)?)),
        }
    }
}

impl From<bool> for ReturnTo {
    fn from(enabled: bool) -> Self {
        if enabled { ReturnTo::Always } else { ReturnTo::Never }
    }
}

impl From<ReturnPathMatcher> for ReturnTo {
    fn from(matcher: ReturnPathMatcher) -> Self {
        ReturnTo::Matching(matcher)
    }
}

impl From<Regex> for ReturnTo {
    fn from(re: Regex) -> Self {
        ReturnTo::Matching(ReturnPathMatcher::from_regex(re))
    }
}
