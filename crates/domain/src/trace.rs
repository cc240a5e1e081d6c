use serde::Serialize;

/// Structured trace events emitted across all Lovent crates.
///
/// Secrets never travel through these: the auto-login token and the storage
/// master key are reduced to booleans before an event is built.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    StorageOpened {
        tier: String,
        namespace: String,
    },
    StorageFallback {
        namespace: String,
        reason: String,
    },
    StorageFailure {
        op: String,
        error: String,
    },
    SessionSaved {
        user_id: String,
        remember_me: bool,
        auto_login: bool,
    },
    SessionExpired {
        user_id: String,
        reason: String,
    },
    SessionCleared,
    RememberMeDisabled,
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "lv_event");
    }
}
