//! Cold-start routing: which screen the app opens on.

use std::fmt;

use serde::Serialize;

use lv_sessions::SessionStore;

/// Where the app goes after the splash screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupRoute {
    /// Remember-me session with a token: skip the login screen and sign in
    /// silently.
    AutoLogin,
    /// A valid session without auto-login: go straight to the main screen.
    Resume,
    /// No valid session.
    Login,
}

impl fmt::Display for StartupRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutoLogin => f.write_str("auto_login"),
            Self::Resume => f.write_str("resume"),
            Self::Login => f.write_str("login"),
        }
    }
}

/// Refresh the stored session, then pick the route.
pub fn decide_startup_route(sessions: &SessionStore) -> StartupRoute {
    sessions.refresh_session();
    let route = if sessions.can_auto_login() {
        StartupRoute::AutoLogin
    } else if sessions.is_logged_in() {
        StartupRoute::Resume
    } else {
        StartupRoute::Login
    };
    tracing::debug!(route = %route, "startup route decided");
    route
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use lv_domain::config::SessionConfig;
    use lv_sessions::{ManualClock, NewSession, OpenedStore};

    use super::*;

    fn store() -> (SessionStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap(),
        ));
        let store = SessionStore::new(OpenedStore::memory(), &SessionConfig::default(), clock.clone());
        (store, clock)
    }

    #[test]
    fn no_session_goes_to_login() {
        let (store, _) = store();
        assert_eq!(decide_startup_route(&store), StartupRoute::Login);
    }

    #[test]
    fn remember_me_with_token_auto_logs_in() {
        let (store, clock) = store();
        store.save_session(
            &NewSession::new("3", "Elif", "elif@example.com")
                .with_remember_me(true)
                .with_auto_login_token("tok"),
        );
        clock.advance(Duration::days(12));
        assert_eq!(decide_startup_route(&store), StartupRoute::AutoLogin);
    }

    #[test]
    fn plain_session_resumes() {
        let (store, clock) = store();
        store.save_session(&NewSession::new("3", "Elif", "elif@example.com"));
        clock.advance(Duration::days(2));
        assert_eq!(decide_startup_route(&store), StartupRoute::Resume);
    }

    #[test]
    fn idle_session_goes_to_login() {
        let (store, clock) = store();
        store.save_session(&NewSession::new("3", "Elif", "elif@example.com"));
        clock.advance(Duration::days(9));
        assert_eq!(decide_startup_route(&store), StartupRoute::Login);
        assert_eq!(store.user_id(), "");
    }

    #[test]
    fn route_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&StartupRoute::AutoLogin).unwrap(),
            "\"auto_login\""
        );
    }
}
