use std::sync::Arc;

use crate::config::Config;
use crate::gate::EnsureLoggedIn;
use crate::session::SessionStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub gate: Arc<EnsureLoggedIn>,
    pub sessions: Arc<SessionStore>,
}
