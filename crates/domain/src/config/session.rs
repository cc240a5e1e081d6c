use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session expiry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Session expiry rules and display defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Absolute session lifetime, measured from login.  Activity does not
    /// extend it.
    #[serde(default = "d_session_ttl_days")]
    pub session_ttl_days: u32,

    /// Rolling inactivity window.  Every successful login check pushes it
    /// forward.  Sessions saved with remember-me are exempt.
    #[serde(default = "d_activity_ttl_days")]
    pub activity_ttl_days: u32,

    /// Name shown by `user_name()` when none has been stored.
    #[serde(default = "d_default_user_name")]
    pub default_user_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: d_session_ttl_days(),
            activity_ttl_days: d_activity_ttl_days(),
            default_user_name: d_default_user_name(),
        }
    }
}

fn d_session_ttl_days() -> u32 {
    30
}

fn d_activity_ttl_days() -> u32 {
    7
}

fn d_default_user_name() -> String {
    "Kullanıcı".into()
}
