//! AppState construction shared by every session command.

use std::sync::Arc;

use anyhow::Context;

use lv_domain::config::{Config, ConfigSeverity};
use lv_sessions::SessionStore;

use crate::state::AppState;

/// Validate config, open the session store and return the wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        anyhow::bail!("config validation failed with {error_count} error(s)");
    }

    // ── Session store ────────────────────────────────────────────────
    let sessions = SessionStore::open(&config).with_context(|| {
        format!(
            "opening session storage in {}",
            config.storage.data_dir.display()
        )
    })?;
    tracing::info!(
        tier = %sessions.tier(),
        data_dir = %config.storage.data_dir.display(),
        "session store ready"
    );

    Ok(AppState::new(config, sessions))
}
