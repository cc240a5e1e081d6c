//! The session store: single owner of the logged-in user's session.
//!
//! Every mutation goes through one atomic commit against the underlying
//! [`KeyValueStore`].  Storage failures never reach callers; they are
//! logged and the session is treated as absent.

use std::sync::Arc;

use lv_domain::config::{Config, SessionConfig};
use lv_domain::error::{Error, Result};
use lv_domain::trace::TraceEvent;

use crate::clock::{Clock, SystemClock};
use crate::lifecycle::{ExpiryPolicy, ExpiryReason, SessionState};
use crate::record::{
    AuthPayload, NewSession, SessionInfo, SessionRecord, UserInfo, KEY_AUTO_LOGIN_TOKEN,
    KEY_LAST_ACTIVITY, KEY_REMEMBER_ME,
};
use crate::storage::{
    open_store, Edit, Entries, KeyValueStore, KeychainKeyProvider, OpenedStore, StorageTier,
};

pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    tier: StorageTier,
    policy: ExpiryPolicy,
    default_name: String,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("backend", &self.store.name())
            .field("tier", &self.tier)
            .field("policy", &self.policy)
            .finish()
    }
}

impl SessionStore {
    pub fn new(opened: OpenedStore, config: &SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: opened.store,
            tier: opened.tier,
            policy: ExpiryPolicy::from(config),
            default_name: config.default_user_name.clone(),
            clock,
        }
    }

    /// Open the configured namespace with the master key from the OS
    /// credential store and the system clock.
    pub fn open(config: &Config) -> Result<Self> {
        let keys = KeychainKeyProvider::new(
            config.storage.keychain_service.as_str(),
            config.storage.keychain_account.as_str(),
        );
        let opened = open_store(&config.storage, &keys)?;
        Ok(Self::new(opened, &config.session, Arc::new(SystemClock)))
    }

    pub fn tier(&self) -> StorageTier {
        self.tier
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    // ── Writes ────────────────────────────────────────────────────────

    /// Replace whatever was stored with a fresh session starting now.
    pub fn save_session(&self, session: &NewSession) {
        let now = self.clock.now_millis();
        if let Err(e) = self.store.commit(session.to_edit(now)) {
            storage_failure("save_session", &e);
            return;
        }

        tracing::info!(
            user_id = %session.user_id,
            remember_me = session.remember_me,
            tier = %self.tier,
            "session saved"
        );
        TraceEvent::SessionSaved {
            user_id: session.user_id.clone(),
            remember_me: session.remember_me,
            auto_login: session.auto_login_token.is_some(),
        }
        .emit();
    }

    /// Save the Authenticator's user payload together with the user's
    /// remember-me choice.
    pub fn save_from_payload(&self, payload: AuthPayload, remember_me: bool) {
        self.save_session(&payload.into_new_session(remember_me));
    }

    /// Wipe every key in the namespace.
    pub fn clear_session(&self) {
        if let Err(e) = self.store.commit(Edit::new().clear()) {
            storage_failure("clear_session", &e);
            return;
        }
        tracing::info!("session cleared");
        TraceEvent::SessionCleared.emit();
    }

    /// Turn off auto-login while keeping the current session.
    pub fn disable_remember_me(&self) {
        let edit = Edit::new()
            .put_bool(KEY_REMEMBER_ME, false)
            .put_str(KEY_AUTO_LOGIN_TOKEN, "");
        if let Err(e) = self.store.commit(edit) {
            storage_failure("disable_remember_me", &e);
            return;
        }
        tracing::info!("remember-me disabled");
        TraceEvent::RememberMeDisabled.emit();
    }

    // ── Gated checks ──────────────────────────────────────────────────

    /// Whether a valid session exists.
    ///
    /// Not a pure read: an expired session is cleared, and a valid one has
    /// its activity timestamp moved to now.  Use [`SessionStore::state`]
    /// for a side-effect-free check.
    pub fn is_logged_in(&self) -> bool {
        self.check("is_logged_in").is_some()
    }

    /// Valid session, remember-me on, and an auto-login token stored.
    pub fn can_auto_login(&self) -> bool {
        self.check("can_auto_login")
            .is_some_and(|record| record.auto_login_ready())
    }

    /// Bump the activity timestamp if the session is still valid.  Called
    /// when the app returns to the foreground.
    pub fn refresh_session(&self) {
        if self.check("refresh_session").is_some() {
            tracing::debug!("session refreshed");
        }
    }

    /// Identity of the logged-in user, or `None` when there is no valid
    /// session.  Same side effects as [`SessionStore::is_logged_in`].
    pub fn user_info(&self) -> Option<UserInfo> {
        self.check("user_info").map(|record| record.user_info())
    }

    /// Evaluate the stored session without touching storage.
    pub fn state(&self) -> SessionState {
        match self.store.snapshot() {
            Ok(entries) => self
                .policy
                .evaluate(&self.record(&entries), self.clock.now_millis()),
            Err(e) => {
                storage_failure("state", &e);
                SessionState::LoggedOut
            }
        }
    }

    /// Evaluate and prune or refresh in one commit.  Returns the record as
    /// stored afterwards when the session is valid.
    fn check(&self, op: &str) -> Option<SessionRecord> {
        let now = self.clock.now_millis();
        let mut valid: Option<SessionRecord> = None;
        let mut expired: Option<(String, ExpiryReason)> = None;

        let result = self.store.update(&mut |entries: &Entries| {
            valid = None;
            expired = None;
            let mut record = self.record(entries);
            match self.policy.evaluate(&record, now) {
                SessionState::LoggedOut => Edit::new(),
                SessionState::Expired(reason) => {
                    expired = Some((record.user_id.clone(), reason));
                    Edit::new().clear()
                }
                SessionState::Active => {
                    // Keep login_time <= last_activity if the clock stepped back.
                    record.last_activity = now.max(record.login_time);
                    let edit = Edit::new().put_i64(KEY_LAST_ACTIVITY, record.last_activity);
                    valid = Some(record);
                    edit
                }
            }
        });

        if let Err(e) = result {
            storage_failure(op, &e);
            return None;
        }

        if let Some((user_id, reason)) = expired {
            tracing::info!(user_id = %user_id, reason = %reason, "session expired");
            TraceEvent::SessionExpired {
                user_id,
                reason: reason.to_string(),
            }
            .emit();
            TraceEvent::SessionCleared.emit();
        }
        valid
    }

    // ── Raw reads ─────────────────────────────────────────────────────

    pub fn user_id(&self) -> String {
        self.raw_record().user_id
    }

    /// Stored display name, or the configured placeholder.
    pub fn user_name(&self) -> String {
        self.raw_record().user_name
    }

    pub fn user_email(&self) -> String {
        self.raw_record().user_email
    }

    pub fn profile_photo_url(&self) -> Option<String> {
        self.raw_record().user_photo
    }

    pub fn is_remember_me_enabled(&self) -> bool {
        self.raw_record().remember_me
    }

    pub fn auto_login_token(&self) -> Option<String> {
        self.raw_record().auto_login_token
    }

    /// Timing snapshot.  Does not evaluate expiry.
    pub fn session_info(&self) -> SessionInfo {
        let record = self.raw_record();
        let now = self.clock.now_millis();
        SessionInfo {
            login_time: record.login_time,
            last_activity: record.last_activity,
            remaining_session_time: self.policy.remaining_session(&record, now),
            remaining_activity_time: self.policy.remaining_activity(&record, now),
            remember_me_enabled: record.remember_me,
        }
    }

    fn raw_record(&self) -> SessionRecord {
        let entries = self.store.snapshot().unwrap_or_else(|e| {
            storage_failure("read", &e);
            Entries::default()
        });
        self.record(&entries)
    }

    fn record(&self, entries: &Entries) -> SessionRecord {
        SessionRecord::from_entries(entries, &self.default_name)
    }
}

fn storage_failure(op: &str, error: &Error) {
    tracing::warn!(op = %op, error = %error, "session storage operation failed");
    TraceEvent::StorageFailure {
        op: op.to_owned(),
        error: error.to_string(),
    }
    .emit();
}
