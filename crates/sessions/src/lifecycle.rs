//! Session expiry: an absolute lifetime plus a rolling inactivity window.
//!
//! Evaluated on every login check.  The absolute lifetime is measured from
//! login and never extended.  The inactivity window is measured from the
//! last successful check and is waived for remember-me sessions.

use chrono::Duration;

use lv_domain::config::SessionConfig;

use crate::record::SessionRecord;

/// Why a stored session stopped being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// Older than the absolute lifetime.
    SessionLifetime { age_ms: i64 },
    /// Idle longer than the inactivity window without remember-me.
    Inactivity { idle_ms: i64 },
}

impl std::fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionLifetime { age_ms } => {
                write!(f, "session lifetime exceeded (age {}h)", age_ms / 3_600_000)
            }
            Self::Inactivity { idle_ms } => {
                write!(f, "inactivity window exceeded (idle {}h)", idle_ms / 3_600_000)
            }
        }
    }
}

/// Outcome of evaluating the stored record at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session, or the logged-in flag is off.
    LoggedOut,
    /// A session exists but has expired; it must be cleared.
    Expired(ExpiryReason),
    /// A valid session.
    Active,
}

/// The two expiry rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub session_ttl: Duration,
    pub activity_ttl: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            session_ttl: Duration::days(30),
            activity_ttl: Duration::days(7),
        }
    }
}

impl From<&SessionConfig> for ExpiryPolicy {
    fn from(config: &SessionConfig) -> Self {
        Self {
            session_ttl: Duration::days(config.session_ttl_days.into()),
            activity_ttl: Duration::days(config.activity_ttl_days.into()),
        }
    }
}

impl ExpiryPolicy {
    /// Evaluate `record` at `now_ms`.  Pure: no storage is touched.
    ///
    /// Checks run in order: logged-in flag, absolute lifetime, then
    /// inactivity (skipped for remember-me).  Both limits are exclusive,
    /// so a session exactly at its limit is still active.
    pub fn evaluate(&self, record: &SessionRecord, now_ms: i64) -> SessionState {
        if !record.is_logged_in {
            return SessionState::LoggedOut;
        }

        let age_ms = now_ms.saturating_sub(record.login_time);
        if age_ms > self.session_ttl.num_milliseconds() {
            return SessionState::Expired(ExpiryReason::SessionLifetime { age_ms });
        }

        let idle_ms = now_ms.saturating_sub(record.last_activity);
        if idle_ms > self.activity_ttl.num_milliseconds() && !record.remember_me {
            return SessionState::Expired(ExpiryReason::Inactivity { idle_ms });
        }

        SessionState::Active
    }

    /// Time left before the absolute lifetime runs out, floored at zero.
    pub fn remaining_session(&self, record: &SessionRecord, now_ms: i64) -> i64 {
        let age_ms = now_ms.saturating_sub(record.login_time);
        self.session_ttl
            .num_milliseconds()
            .saturating_sub(age_ms)
            .max(0)
    }

    /// Time left in the inactivity window, floored at zero.
    pub fn remaining_activity(&self, record: &SessionRecord, now_ms: i64) -> i64 {
        let idle_ms = now_ms.saturating_sub(record.last_activity);
        self.activity_ttl
            .num_milliseconds()
            .saturating_sub(idle_ms)
            .max(0)
    }
}
