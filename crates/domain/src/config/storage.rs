use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session storage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where and how the session namespace is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the namespace files (app-private data dir on
    /// mobile).
    #[serde(default = "d_data_dir")]
    pub data_dir: PathBuf,

    /// Fixed namespace for the session keys.  Also the file stem.
    #[serde(default = "d_namespace")]
    pub namespace: String,

    /// `auto` tries the encrypted tier first and falls back to plaintext;
    /// `disabled` goes straight to plaintext.
    #[serde(default)]
    pub encryption: EncryptionMode,

    /// OS credential store service holding the master key.
    #[serde(default = "d_keychain_service")]
    pub keychain_service: String,

    /// OS credential store account holding the master key.
    #[serde(default = "d_keychain_account")]
    pub keychain_account: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: d_data_dir(),
            namespace: d_namespace(),
            encryption: EncryptionMode::Auto,
            keychain_service: d_keychain_service(),
            keychain_account: d_keychain_account(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionMode {
    #[default]
    Auto,
    Disabled,
}

fn d_data_dir() -> PathBuf {
    PathBuf::from(".lovent")
}

fn d_namespace() -> String {
    "lovent_secure_session".into()
}

fn d_keychain_service() -> String {
    "lovent".into()
}

fn d_keychain_account() -> String {
    "session-master-key".into()
}
