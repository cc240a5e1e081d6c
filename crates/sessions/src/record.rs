//! The persisted session record and the projections handed to callers.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::storage::{Edit, Entries};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Storage keys
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const KEY_IS_LOGGED_IN: &str = "is_logged_in";
pub const KEY_USER_ID: &str = "user_id";
pub const KEY_USER_NAME: &str = "user_name";
pub const KEY_USER_EMAIL: &str = "user_email";
pub const KEY_USER_PHOTO: &str = "user_photo";
pub const KEY_LOGIN_TIME: &str = "login_time";
pub const KEY_LAST_ACTIVITY: &str = "last_activity";
pub const KEY_REMEMBER_ME: &str = "remember_me";
pub const KEY_AUTO_LOGIN_TOKEN: &str = "auto_login_token";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Typed view of the session namespace.
///
/// Optional strings are stored as `""` and surface here as `None`.  When
/// `is_logged_in` is false every other field is void.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub is_logged_in: bool,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub user_photo: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub login_time: i64,
    /// Milliseconds since the Unix epoch.  Never earlier than `login_time`.
    pub last_activity: i64,
    pub remember_me: bool,
    pub auto_login_token: Option<String>,
}

impl SessionRecord {
    /// Read the record out of the namespace, substituting defaults for
    /// missing keys.
    pub fn from_entries(entries: &Entries, default_name: &str) -> Self {
        Self {
            is_logged_in: entries.get_bool(KEY_IS_LOGGED_IN, false),
            user_id: entries.get_str(KEY_USER_ID, "").to_owned(),
            user_name: entries.get_str(KEY_USER_NAME, default_name).to_owned(),
            user_email: entries.get_str(KEY_USER_EMAIL, "").to_owned(),
            user_photo: non_empty(entries.get_str(KEY_USER_PHOTO, "")),
            login_time: entries.get_i64(KEY_LOGIN_TIME, 0),
            last_activity: entries.get_i64(KEY_LAST_ACTIVITY, 0),
            remember_me: entries.get_bool(KEY_REMEMBER_ME, false),
            auto_login_token: non_empty(entries.get_str(KEY_AUTO_LOGIN_TOKEN, "")),
        }
    }

    /// Auto-login needs both the opt-in and a token to present.
    pub fn auto_login_ready(&self) -> bool {
        self.remember_me && self.auto_login_token.is_some()
    }

    pub fn user_info(&self) -> UserInfo {
        UserInfo {
            id: self.user_id.clone(),
            name: self.user_name.clone(),
            email: self.user_email.clone(),
            photo_url: self.user_photo.clone(),
        }
    }
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("is_logged_in", &self.is_logged_in)
            .field("user_id", &self.user_id)
            .field("user_name", &self.user_name)
            .field("user_email", &self.user_email)
            .field("user_photo", &self.user_photo)
            .field("login_time", &self.login_time)
            .field("last_activity", &self.last_activity)
            .field("remember_me", &self.remember_me)
            .field(
                "auto_login_token",
                &self.auto_login_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_owned())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// New sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Identity handed over by the authenticator after a successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct NewSession {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub remember_me: bool,
    pub auto_login_token: Option<String>,
}

impl NewSession {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            email: email.into(),
            photo_url: None,
            remember_me: false,
            auto_login_token: None,
        }
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    pub fn with_remember_me(mut self, remember_me: bool) -> Self {
        self.remember_me = remember_me;
        self
    }

    pub fn with_auto_login_token(mut self, token: impl Into<String>) -> Self {
        self.auto_login_token = Some(token.into());
        self
    }

    /// The batch that replaces whatever was stored before.  Every key is
    /// written, optional ones as `""`.
    pub(crate) fn to_edit(&self, now_millis: i64) -> Edit {
        Edit::new()
            .clear()
            .put_bool(KEY_IS_LOGGED_IN, true)
            .put_str(KEY_USER_ID, self.user_id.as_str())
            .put_str(KEY_USER_NAME, self.name.as_str())
            .put_str(KEY_USER_EMAIL, self.email.as_str())
            .put_str(KEY_USER_PHOTO, self.photo_url.clone().unwrap_or_default())
            .put_i64(KEY_LOGIN_TIME, now_millis)
            .put_i64(KEY_LAST_ACTIVITY, now_millis)
            .put_bool(KEY_REMEMBER_ME, self.remember_me)
            .put_str(
                KEY_AUTO_LOGIN_TOKEN,
                self.auto_login_token.clone().unwrap_or_default(),
            )
    }
}

impl fmt::Debug for NewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewSession")
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("photo_url", &self.photo_url)
            .field("remember_me", &self.remember_me)
            .field(
                "auto_login_token",
                &self.auto_login_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Authenticator payload
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The `user` object returned by the login and registration endpoints.
///
/// The backend sends `id` as a number or a string depending on the
/// endpoint; both are accepted.
#[derive(Clone, Deserialize)]
pub struct AuthPayload {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl AuthPayload {
    /// Combine the payload with the user's remember-me choice.  Empty
    /// optional strings count as absent.
    pub fn into_new_session(self, remember_me: bool) -> NewSession {
        NewSession {
            user_id: self.id,
            name: self.name,
            email: self.email,
            photo_url: self.profile_photo.filter(|s| !s.is_empty()),
            remember_me,
            auto_login_token: self.token.filter(|s| !s.is_empty()),
        }
    }
}

impl fmt::Debug for AuthPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthPayload")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("profile_photo", &self.profile_photo)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn id_as_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Str(String),
        Num(i64),
    }

    Ok(match RawId::deserialize(d)? {
        RawId::Str(s) => s,
        RawId::Num(n) => n.to_string(),
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Read-only projections
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Identity of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

/// Timing snapshot for diagnostics.  Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub login_time: i64,
    pub last_activity: i64,
    pub remaining_session_time: i64,
    pub remaining_activity_time: i64,
    pub remember_me_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_namespace_reads_as_logged_out() {
        let record = SessionRecord::from_entries(&Entries::default(), "Kullanıcı");
        assert!(!record.is_logged_in);
        assert_eq!(record.user_name, "Kullanıcı");
        assert_eq!(record.user_photo, None);
        assert_eq!(record.auto_login_token, None);
        assert_eq!(record.login_time, 0);
    }

    #[test]
    fn new_session_writes_every_key() {
        let mut entries = Entries::default();
        entries.apply(&NewSession::new("7", "Ayşe", "ayse@example.com").to_edit(1_000));
        for key in [
            KEY_IS_LOGGED_IN,
            KEY_USER_ID,
            KEY_USER_NAME,
            KEY_USER_EMAIL,
            KEY_USER_PHOTO,
            KEY_LOGIN_TIME,
            KEY_LAST_ACTIVITY,
            KEY_REMEMBER_ME,
            KEY_AUTO_LOGIN_TOKEN,
        ] {
            assert!(entries.contains_key(key), "missing {key}");
        }
        assert_eq!(entries.get_str(KEY_USER_PHOTO, "x"), "");
        assert_eq!(entries.get_str(KEY_AUTO_LOGIN_TOKEN, "x"), "");
    }

    #[test]
    fn new_session_replaces_stale_keys() {
        let mut entries = Entries::default();
        entries.apply(&Edit::new().put_str("legacy_key", "old"));
        entries.apply(&NewSession::new("7", "Ayşe", "a@b.c").to_edit(1));
        assert!(!entries.contains_key("legacy_key"));
    }

    #[test]
    fn auto_login_needs_token_and_opt_in() {
        let mut entries = Entries::default();
        entries.apply(
            &NewSession::new("1", "n", "e")
                .with_remember_me(true)
                .to_edit(0),
        );
        assert!(!SessionRecord::from_entries(&entries, "").auto_login_ready());

        entries.apply(
            &NewSession::new("1", "n", "e")
                .with_auto_login_token("abc")
                .to_edit(0),
        );
        assert!(!SessionRecord::from_entries(&entries, "").auto_login_ready());

        entries.apply(
            &NewSession::new("1", "n", "e")
                .with_remember_me(true)
                .with_auto_login_token("abc")
                .to_edit(0),
        );
        assert!(SessionRecord::from_entries(&entries, "").auto_login_ready());
    }

    #[test]
    fn payload_numeric_id() {
        let payload: AuthPayload = serde_json::from_str(
            r#"{"id": 42, "name": "Mehmet", "email": "m@example.com", "profile_photo": null, "token": "t0k"}"#,
        )
        .unwrap();
        let session = payload.into_new_session(true);
        assert_eq!(session.user_id, "42");
        assert_eq!(session.photo_url, None);
        assert_eq!(session.auto_login_token.as_deref(), Some("t0k"));
        assert!(session.remember_me);
    }

    #[test]
    fn payload_string_id_and_empty_optionals() {
        let payload: AuthPayload = serde_json::from_str(
            r#"{"id": "u-9", "name": "Zeynep", "email": "z@example.com", "profile_photo": "", "token": ""}"#,
        )
        .unwrap();
        let session = payload.into_new_session(false);
        assert_eq!(session.user_id, "u-9");
        assert_eq!(session.photo_url, None);
        assert_eq!(session.auto_login_token, None);
    }

    #[test]
    fn payload_without_id_is_rejected() {
        assert!(serde_json::from_str::<AuthPayload>(r#"{"name": "x"}"#).is_err());
    }

    #[test]
    fn debug_redacts_tokens() {
        let session = NewSession::new("1", "n", "e").with_auto_login_token("super-secret");
        assert!(!format!("{session:?}").contains("super-secret"));

        let mut entries = Entries::default();
        entries.apply(&session.to_edit(0));
        let record = SessionRecord::from_entries(&entries, "");
        assert!(!format!("{record:?}").contains("super-secret"));
    }
}
