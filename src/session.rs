use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use dashmap::DashMap;

use crate::error::AppError;
use crate::state::SharedState;

pub const SESSION_COOKIE: &str = "sid";

/// Session key holding the signed-in user's name.
pub const USER_KEY: &str = "user";

struct SessionRecord {
    values: HashMap<String, String>,
    last_seen: Instant,
}

/// In-memory session storage keyed by a random session id.
pub struct SessionStore {
    /// session id -> (values, last_seen)
    entries: DashMap<String, SessionRecord>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Start an empty session and return its id.
    pub fn create(&self) -> String {
        let id = generate_session_id();
        self.entries.insert(
            id.clone(),
            SessionRecord {
                values: HashMap::new(),
                last_seen: Instant::now(),
            },
        );
        id
    }

    /// Mark the session as used. Returns false when it does not exist.
    pub fn touch(&self, id: &str) -> bool {
        match self.entries.get_mut(id) {
            Some(mut record) => {
                record.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str, key: &str) -> Option<String> {
        self.entries.get(id)?.values.get(key).cloned()
    }

    /// Returns false when the session no longer exists.
    pub fn insert(&self, id: &str, key: &str, value: &str) -> bool {
        match self.entries.get_mut(id) {
            Some(mut record) => {
                record.values.insert(key.to_string(), value.to_string());
                record.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &str, key: &str) -> Option<String> {
        self.entries.get_mut(id)?.values.remove(key)
    }

    /// Move a session's values under a fresh id. The old id stops existing.
    pub fn rotate(&self, id: &str) -> Option<String> {
        let (_, record) = self.entries.remove(id)?;
        let new_id = generate_session_id();
        self.entries.insert(
            new_id.clone(),
            SessionRecord {
                values: record.values,
                last_seen: Instant::now(),
            },
        );
        Some(new_id)
    }

    pub fn destroy(&self, id: &str) {
        self.entries.remove(id);
    }

    /// Drop sessions idle for longer than `max_idle`.
    pub fn cleanup(&self, max_idle: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, record| now.duration_since(record.last_seen) < max_idle);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_session_id() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Periodically expire idle sessions.
pub fn spawn_cleanup(
    store: Arc<SessionStore>,
    max_idle: Duration,
) -> tokio::task::JoinHandle<()> {
    let period = (max_idle / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            store.cleanup(max_idle);
            tracing::debug!("Session cleanup done, {} active", store.len());
        }
    })
}

/// Handle to the current request's session, placed in the request extensions
/// by [`load_session`].
///
/// Nothing is stored until the first write; the handle then allocates an id
/// and [`load_session`] issues the cookie.
#[derive(Clone)]
pub struct Session {
    id: Arc<Mutex<Option<String>>>,
    store: Arc<SessionStore>,
}

impl Session {
    fn new(id: Option<String>, store: Arc<SessionStore>) -> Self {
        Self {
            id: Arc::new(Mutex::new(id)),
            store,
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.id.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The id, if the session has been stored.
    pub fn id(&self) -> Option<String> {
        self.slot().clone()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let id = self.id()?;
        self.store.get(&id, key)
    }

    pub fn insert(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut slot = self.slot();
        let live = slot.clone().filter(|id| self.store.contains(id));
        let id = match live {
            Some(id) => id,
            None => {
                let id = self.store.create();
                *slot = Some(id.clone());
                id
            }
        };

        if self.store.insert(&id, key, value) {
            Ok(())
        } else {
            Err(AppError::Internal(format!("Session {id} vanished mid-request")))
        }
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        let id = self.id()?;
        self.store.remove(&id, key)
    }

    /// Give the session a new id, keeping its values. Called on privilege
    /// changes so an id known before sign-in is worthless afterwards.
    pub fn cycle_id(&self) {
        let mut slot = self.slot();
        if let Some(id) = slot.clone() {
            *slot = self.store.rotate(&id);
        }
    }

    pub fn destroy(&self) {
        if let Some(id) = self.slot().take() {
            self.store.destroy(&id);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.id()).finish()
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Session layer is not installed".to_string()))
    }
}

/// The signed-in user. Present in the request extensions only when the
/// session carries one.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

/// Middleware that attaches a [`Session`] (and [`CurrentUser`] when signed in)
/// to every request. The `sid` cookie is set whenever the request ends with a
/// different session id than it started with, and cleared when the session
/// was destroyed.
pub async fn load_session(
    State(state): State<SharedState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let presented = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let existing = presented.clone().filter(|id| state.sessions.touch(id));

    let session = Session::new(existing, state.sessions.clone());

    if let Some(user) = session.get(USER_KEY) {
        req.extensions_mut().insert(CurrentUser(user));
    }
    req.extensions_mut().insert(session.clone());

    let response = next.run(req).await;

    match (presented, session.id()) {
        (presented, current) if presented == current => response,
        (_, Some(id)) => {
            let cookie = Cookie::build((SESSION_COOKIE, id))
                .path("/")
                .http_only(true)
                .secure(state.config.secure_cookies)
                .same_site(SameSite::Lax)
                .build();
            (jar.add(cookie), response).into_response()
        }
        (Some(_), None) => {
            let cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
            (jar.remove(cookie), response).into_response()
        }
        (None, None) => response,
    }
}
