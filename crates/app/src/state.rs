use std::sync::Arc;

use lv_domain::config::Config;
use lv_sessions::SessionStore;

/// Shared application state handed to every screen and command.
///
/// Owns the one [`SessionStore`] of the process.  Clone freely; clones
/// share the store.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Arc<Config>, sessions: SessionStore) -> Self {
        Self {
            config,
            sessions: Arc::new(sessions),
        }
    }
}
