mod observability;
mod session;
mod storage;

pub use observability::*;
pub use session::*;
pub use storage::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing keys.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))
    }

    /// Load from file if it exists, otherwise return defaults.
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.session.session_ttl_days == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "session.session_ttl_days".into(),
                message: "session lifetime must be at least one day".into(),
            });
        }

        if self.session.activity_ttl_days == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "session.activity_ttl_days".into(),
                message: "inactivity window must be at least one day".into(),
            });
        }

        // The absolute lifetime always fires first in that case.
        if self.session.activity_ttl_days > self.session.session_ttl_days {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "session.activity_ttl_days".into(),
                message: format!(
                    "inactivity window ({}d) exceeds session lifetime ({}d) and can never expire a session",
                    self.session.activity_ttl_days, self.session.session_ttl_days
                ),
            });
        }

        if self.storage.namespace.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "storage.namespace".into(),
                message: "namespace must not be empty".into(),
            });
        }

        if self.storage.encryption == EncryptionMode::Disabled {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "storage.encryption".into(),
                message: "session data will be stored unencrypted".into(),
            });
        }

        if self.storage.encryption == EncryptionMode::Auto
            && (self.storage.keychain_service.is_empty()
                || self.storage.keychain_account.is_empty())
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "storage.keychain_service".into(),
                message: "keychain service and account are required when encryption is enabled"
                    .into(),
            });
        }

        errors
    }
}
